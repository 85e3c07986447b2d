pub mod artist;
pub mod artist_kind;
pub mod ids;
pub mod links;

pub use artist::Artist;
pub use artist_kind::{ArtistKind, ArtistKindParseError};
pub use ids::ArtistId;
pub use links::{ArtistLink, DeclaredLink, Relation, Tenure};
