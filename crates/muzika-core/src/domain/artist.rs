use serde::{Deserialize, Serialize};

use crate::domain::artist_kind::ArtistKind;
use crate::domain::ids::ArtistId;
use crate::domain::links::{ArtistLink, Relation};

/// Representa a un artista del portal: un solista o un grupo.
///
/// Las relaciones con otros artistas se guardan en ambos extremos. El
/// artista es dueño de su mitad; la otra mitad vive en el contraparte y la
/// mantiene el [`RelationSynchronizer`](crate::relations::RelationSynchronizer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
  /// Identificador único del artista.
  pub id: ArtistId,

  /// Nombre público del artista.
  pub name: String,

  /// Solista o grupo.
  pub kind: ArtistKind,

  /// Biografía opcional.
  pub bio: Option<String>,

  /// Grupos a los que pertenece (sólo tiene sentido en un `Solo`).
  #[serde(default)]
  pub memberships: Vec<ArtistLink>,

  /// Miembros del grupo (sólo tiene sentido en un `Group`).
  #[serde(default)]
  pub members: Vec<ArtistLink>,

  /// Artistas relacionados, de cualquier tipo.
  #[serde(default)]
  pub related: Vec<ArtistLink>,

  /// Versión de la fila en el repositorio, usada para control optimista
  /// de concurrencia. `0` significa que nunca se ha guardado.
  #[serde(default)]
  pub version: u64,
}

impl Artist {
  pub fn new(name: impl Into<String>, kind: ArtistKind) -> Self {
    Artist {
      id: ArtistId::new(),
      name: name.into(),
      kind,
      bio: None,
      memberships: vec![],
      members: vec![],
      related: vec![],
      version: 0,
    }
  }

  pub fn solo(name: impl Into<String>) -> Self {
    Self::new(name, ArtistKind::Solo)
  }

  pub fn group(name: impl Into<String>) -> Self {
    Self::new(name, ArtistKind::Group)
  }

  /// La lista donde este artista guarda su mitad de `relation`.
  ///
  /// Para `Membership` depende del tipo: un solista usa `memberships` y un
  /// grupo usa `members`.
  pub fn links(&self, relation: Relation) -> &[ArtistLink] {
    match (relation, self.kind) {
      (Relation::Membership, ArtistKind::Solo) => &self.memberships,
      (Relation::Membership, ArtistKind::Group) => &self.members,
      (Relation::Related, _) => &self.related,
    }
  }

  pub fn links_mut(&mut self, relation: Relation) -> &mut Vec<ArtistLink> {
    match (relation, self.kind) {
      (Relation::Membership, ArtistKind::Solo) => &mut self.memberships,
      (Relation::Membership, ArtistKind::Group) => &mut self.members,
      (Relation::Related, _) => &mut self.related,
    }
  }

  /// La lista de pertenencia que no corresponde al tipo actual.
  ///
  /// Sólo tiene contenido si el artista cambió de tipo después de guardar
  /// relaciones.
  pub(crate) fn stale_membership_side_mut(&mut self) -> &mut Vec<ArtistLink> {
    match self.kind {
      ArtistKind::Solo => &mut self.members,
      ArtistKind::Group => &mut self.memberships,
    }
  }

  pub fn link_to(&self, relation: Relation, other: ArtistId) -> Option<&ArtistLink> {
    self.links(relation).iter().find(|l| l.artist_id == other)
  }

  /// `true` si cualquiera de las listas del artista apunta a `other`.
  pub fn references(&self, other: ArtistId) -> bool {
    self.memberships.iter().chain(&self.members).chain(&self.related).any(|l| l.artist_id == other)
  }

  /// Ids de todos los artistas mencionados en cualquiera de sus listas.
  pub fn referenced_ids(&self) -> impl Iterator<Item = ArtistId> + '_ {
    self.memberships.iter().chain(&self.members).chain(&self.related).map(|l| l.artist_id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::links::Tenure;

  #[test]
  fn membership_side_follows_kind() {
    let group_id = ArtistId::new();
    let mut solo = Artist::solo("Andrius Mamontovas");
    solo.memberships.push(ArtistLink::new(group_id, "Foje", Tenure::new("1983", "1997")));

    assert_eq!(solo.links(Relation::Membership).len(), 1);
    assert!(solo.link_to(Relation::Membership, group_id).is_some());

    let group = Artist::group("Foje");
    assert!(group.links(Relation::Membership).is_empty());
  }

  #[test]
  fn references_checks_every_list() {
    let other = ArtistId::new();
    let mut a = Artist::solo("A");
    assert!(!a.references(other));

    a.related.push(ArtistLink::new(other, "B", Tenure::default()));
    assert!(a.references(other));
    assert_eq!(a.referenced_ids().collect::<Vec<_>>(), vec![other]);
  }
}
