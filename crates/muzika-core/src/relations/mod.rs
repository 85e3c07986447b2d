//! Relaciones bidireccionales entre artistas.
//!
//! Cada relación (pertenencia solista ↔ grupo y artista relacionado) se
//! guarda dos veces, una en cada extremo. Este módulo mantiene ambas mitades
//! de acuerdo y permite auditar una colección completa.

mod consistency;
mod synchronizer;

pub use consistency::{Inconsistency, check_consistency};
pub use synchronizer::RelationSynchronizer;
