use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::domain::{Artist, ArtistId, Relation, Tenure};

/// Una violación de la simetría de relaciones encontrada en una colección.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inconsistency {
  /// `from` apunta a `to` pero `to` no apunta de vuelta.
  MissingBackReference { relation: Relation, from: ArtistId, to: ArtistId },
  /// Ambas mitades existen pero con intervalos distintos.
  TenureMismatch { relation: Relation, from: ArtistId, to: ArtistId, from_tenure: Tenure, to_tenure: Tenure },
  /// Pertenencia entre dos artistas del mismo tipo.
  KindMismatch { from: ArtistId, to: ArtistId },
  /// Un artista relacionado consigo mismo.
  SelfReference { relation: Relation, id: ArtistId },
  /// La misma contraparte aparece dos veces en una lista.
  DuplicateLink { relation: Relation, from: ArtistId, to: ArtistId },
}

impl fmt::Display for Inconsistency {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Inconsistency::MissingBackReference { relation, from, to } => {
        write!(f, "{relation}: {from} -> {to} has no back reference")
      }
      Inconsistency::TenureMismatch { relation, from, to, from_tenure, to_tenure } => write!(
        f,
        "{relation}: {from} <-> {to} disagree on tenure ({}-{} vs {}-{})",
        from_tenure.year_from, from_tenure.year_to, to_tenure.year_from, to_tenure.year_to
      ),
      Inconsistency::KindMismatch { from, to } => {
        write!(f, "membership: {from} -> {to} links two artists of the same kind")
      }
      Inconsistency::SelfReference { relation, id } => write!(f, "{relation}: {id} references itself"),
      Inconsistency::DuplicateLink { relation, from, to } => {
        write!(f, "{relation}: {from} lists {to} more than once")
      }
    }
  }
}

/// Revisa que cada relación de la colección esté guardada en ambos
/// extremos con el mismo intervalo.
///
/// Las referencias a artistas que no están en la colección se toleran
/// (referencias blandas) y no se reportan.
pub fn check_consistency(entities: &[Artist]) -> Vec<Inconsistency> {
  let index: HashMap<ArtistId, &Artist> = entities.iter().map(|a| (a.id, a)).collect();
  let mut found = Vec::new();

  for artist in entities {
    for relation in [Relation::Membership, Relation::Related] {
      let mut seen = HashSet::new();

      for link in artist.links(relation) {
        if !seen.insert(link.artist_id) {
          found.push(Inconsistency::DuplicateLink { relation, from: artist.id, to: link.artist_id });
          continue;
        }

        if link.artist_id == artist.id {
          found.push(Inconsistency::SelfReference { relation, id: artist.id });
          continue;
        }

        let Some(other) = index.get(&link.artist_id) else {
          continue;
        };

        if relation == Relation::Membership && other.kind != artist.kind.complement() {
          found.push(Inconsistency::KindMismatch { from: artist.id, to: other.id });
          continue;
        }

        match other.link_to(relation, artist.id) {
          None => found.push(Inconsistency::MissingBackReference {
            relation,
            from: artist.id,
            to: other.id,
          }),
          // Cada par se visita dos veces; se reporta una sola.
          Some(back) if back.tenure != link.tenure && artist.id < other.id => {
            found.push(Inconsistency::TenureMismatch {
              relation,
              from: artist.id,
              to: other.id,
              from_tenure: link.tenure.clone(),
              to_tenure: back.tenure.clone(),
            })
          }
          Some(_) => {}
        }
      }
    }
  }

  found
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::ArtistLink;

  #[test]
  fn empty_catalog_is_consistent() {
    assert!(check_consistency(&[]).is_empty());
  }

  #[test]
  fn reports_missing_back_reference() {
    let g = Artist::group("G");
    let mut s = Artist::solo("S");
    s.memberships.push(ArtistLink::new(g.id, "G", Tenure::new("2010", "")));

    let found = check_consistency(&[s.clone(), g.clone()]);

    assert_eq!(
      found,
      vec![Inconsistency::MissingBackReference { relation: Relation::Membership, from: s.id, to: g.id }]
    );
  }

  #[test]
  fn reports_tenure_mismatch_once() {
    let mut a = Artist::solo("A");
    let mut b = Artist::solo("B");
    a.related.push(ArtistLink::new(b.id, "B", Tenure::new("2005", "2008")));
    b.related.push(ArtistLink::new(a.id, "A", Tenure::new("2005", "")));

    let found = check_consistency(&[a, b]);

    assert_eq!(found.len(), 1);
    assert!(matches!(found[0], Inconsistency::TenureMismatch { relation: Relation::Related, .. }));
  }

  #[test]
  fn dangling_references_are_tolerated() {
    let mut a = Artist::solo("A");
    a.related.push(ArtistLink::new(ArtistId::new(), "ghost", Tenure::default()));

    assert!(check_consistency(&[a]).is_empty());
  }

  #[test]
  fn reports_self_and_duplicate_links() {
    let mut a = Artist::solo("A");
    let b = Artist::solo("B");
    a.related.push(ArtistLink::new(a.id, "A", Tenure::default()));
    a.related.push(ArtistLink::new(b.id, "B", Tenure::default()));
    a.related.push(ArtistLink::new(b.id, "B", Tenure::default()));

    let found = check_consistency(&[a.clone(), b]);

    assert!(found.contains(&Inconsistency::SelfReference { relation: Relation::Related, id: a.id }));
    assert!(found.iter().any(|i| matches!(i, Inconsistency::DuplicateLink { .. })));
  }

  #[test]
  fn reports_membership_between_groups() {
    let mut g1 = Artist::group("G1");
    let mut g2 = Artist::group("G2");
    g1.members.push(ArtistLink::new(g2.id, "G2", Tenure::default()));
    g2.members.push(ArtistLink::new(g1.id, "G1", Tenure::default()));

    let found = check_consistency(&[g1, g2]);

    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|i| matches!(i, Inconsistency::KindMismatch { .. })));
  }
}
