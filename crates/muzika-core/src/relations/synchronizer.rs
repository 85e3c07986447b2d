use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::domain::{Artist, ArtistId, ArtistLink, DeclaredLink, Relation};

/// Mantiene la simetría de las relaciones entre artistas.
///
/// Dado un artista editado y las relaciones que el editor declaró para él,
/// actualiza a los contrapartes para que ambas mitades de cada relación
/// coincidan, y elimina las mitades que ya no están declaradas.
///
/// Es una transformación pura sobre una instantánea en memoria: no hace
/// I/O, no falla y nunca modifica la entrada. Persistir el resultado de
/// forma atómica es trabajo del llamador (ver
/// [`RelationService`](crate::services::RelationService)).
///
/// El algoritmo tiene dos fases:
/// 1. *alta/actualización*: cada contraparte declarado recibe (o actualiza)
///    su referencia de vuelta con el intervalo declarado;
/// 2. *poda*: cualquier otro artista que todavía apunte al editado y no
///    esté en el conjunto declarado original pierde esa referencia.
pub struct RelationSynchronizer;

impl RelationSynchronizer {
  /// Reconcilia una sola relación y devuelve la colección completa nueva.
  ///
  /// `edited` reemplaza a la fila con su mismo id (o se añade al final si es
  /// nueva). Para un artista ya existente sólo se toman del editado sus
  /// campos escalares y la lista de `relation`; la otra relación se
  /// conserva tal como está en la instantánea, salvo que cambie el tipo del
  /// artista: entonces sus pertenencias se vuelven a reconciliar para el
  /// tipo nuevo.
  pub fn reconcile(
    entities: &[Artist],
    edited: &Artist,
    relation: Relation,
    declared: &[DeclaredLink],
  ) -> Vec<Artist> {
    let mut next = entities.to_vec();
    reconcile_in_place(&mut next, edited, relation, declared);
    next
  }

  /// Reconcilia pertenencias y artistas relacionados en una sola pasada,
  /// que es lo que ocurre al guardar un artista desde el panel.
  ///
  /// `declared_membership` son los grupos (si `edited` es solista) o los
  /// miembros (si es grupo).
  pub fn reconcile_all(
    entities: &[Artist],
    edited: &Artist,
    declared_membership: &[DeclaredLink],
    declared_related: &[DeclaredLink],
  ) -> Vec<Artist> {
    let mut next = entities.to_vec();
    let idx = reconcile_in_place(&mut next, edited, Relation::Membership, declared_membership);
    let edited = next[idx].clone();
    reconcile_in_place(&mut next, &edited, Relation::Related, declared_related);
    next
  }

  /// Repara toda la colección.
  ///
  /// Cada artista se reconcilia con la unión de sus propias listas y de las
  /// referencias que otros tienen hacia él, así que una relación que sólo
  /// existe en una de las dos mitades se completa en vez de perderse. Si
  /// ambas mitades discrepan en el intervalo, gana la del artista que se
  /// procesa primero (orden de `entities`).
  pub fn repair(entities: &[Artist]) -> Vec<Artist> {
    let mut next = entities.to_vec();

    for id in entities.iter().map(|a| a.id) {
      let Some(artist) = next.iter().find(|a| a.id == id).cloned() else {
        continue;
      };
      let membership = declared_with_incoming(&next, &artist, Relation::Membership);
      let related = declared_with_incoming(&next, &artist, Relation::Related);
      next = Self::reconcile_all(&next, &artist, &membership, &related);
    }

    next
  }

  /// Elimina a `id` de la colección y todas las referencias que otros
  /// artistas tienen hacia él.
  ///
  /// Equivale a reconciliar el artista borrado con listas vacías y después
  /// quitar su fila.
  pub fn detach(entities: &[Artist], id: ArtistId) -> Vec<Artist> {
    let mut scrubbed = 0usize;

    let next: Vec<Artist> = entities
      .iter()
      .filter(|a| a.id != id)
      .cloned()
      .map(|mut artist| {
        for list in [&mut artist.memberships, &mut artist.members, &mut artist.related] {
          let before = list.len();
          list.retain(|l| l.artist_id != id);
          scrubbed += before - list.len();
        }
        artist
      })
      .collect();

    debug!(artist = %id, scrubbed, "detached artist from catalog");
    next
  }
}

/// Aplica la reconciliación sobre `next` y devuelve el índice del editado.
fn reconcile_in_place(
  next: &mut Vec<Artist>,
  edited: &Artist,
  relation: Relation,
  declared: &[DeclaredLink],
) -> usize {
  let previous_kind = next.iter().find(|a| a.id == edited.id).map(|a| a.kind);
  let edited_idx = upsert_edited(next, edited);

  // Un cambio de tipo invalida las pertenencias aunque sólo se edite la
  // otra relación: se reconcilian con la lista del tipo nuevo.
  if relation == Relation::Related && previous_kind.is_some_and(|k| k != edited.kind) {
    let current = next[edited_idx].clone();
    let membership: Vec<DeclaredLink> =
      current.links(Relation::Membership).iter().map(DeclaredLink::from).collect();
    reconcile_in_place(next, &current, Relation::Membership, &membership);
  }

  let index: HashMap<ArtistId, usize> = next.iter().enumerate().map(|(i, a)| (a.id, i)).collect();

  let links = normalize_declared(next.as_slice(), &index, &next[edited_idx], relation, declared);
  let declared_ids: HashSet<ArtistId> = links.iter().map(|l| l.artist_id).collect();

  let (edited_id, edited_name) = {
    let own = &mut next[edited_idx];
    *own.links_mut(relation) = links.clone();
    if relation == Relation::Membership {
      own.stale_membership_side_mut().clear();
    }
    (own.id, own.name.clone())
  };

  // Fase 1: alta / actualización.
  let mut added = 0usize;
  let mut updated = 0usize;
  for link in &links {
    let Some(&i) = index.get(&link.artist_id) else {
      warn!(artist = %edited_id, counterpart = %link.artist_id, %relation, "declared counterpart not found, skipping");
      continue;
    };

    let back = next[i].links_mut(relation);
    if upsert_back_reference(back, edited_id, &edited_name, link) {
      added += 1;
    } else {
      updated += 1;
    }
  }

  // Fase 2: poda, siempre contra el conjunto declarado original.
  let mut pruned = 0usize;
  for (i, artist) in next.iter_mut().enumerate() {
    if i == edited_idx || declared_ids.contains(&artist.id) {
      continue;
    }

    let back = artist.links_mut(relation);
    let before = back.len();
    back.retain(|l| l.artist_id != edited_id);
    if back.len() != before {
      pruned += 1;
    }
  }

  debug!(artist = %edited_id, %relation, declared = links.len(), added, updated, pruned, "reconciled relations");
  edited_idx
}

/// Copia el editado dentro de la colección.
///
/// Si ya existía, sólo se actualizan los campos escalares; las listas de
/// relaciones las escribe después la reconciliación.
fn upsert_edited(next: &mut Vec<Artist>, edited: &Artist) -> usize {
  match next.iter().position(|a| a.id == edited.id) {
    Some(i) => {
      let stored = &mut next[i];
      stored.name = edited.name.clone();
      stored.kind = edited.kind;
      stored.bio = edited.bio.clone();
      stored.version = edited.version;
      i
    }
    None => {
      next.push(edited.clone());
      next.len() - 1
    }
  }
}

/// Lista propia de `artist` más las referencias entrantes que le faltan.
fn declared_with_incoming(entities: &[Artist], artist: &Artist, relation: Relation) -> Vec<DeclaredLink> {
  let own = artist.links(relation);
  let mut declared: Vec<DeclaredLink> = own.iter().map(DeclaredLink::from).collect();

  for other in entities.iter().filter(|o| o.id != artist.id) {
    if own.iter().any(|l| l.artist_id == other.id) {
      continue;
    }
    if let Some(incoming) = other.link_to(relation, artist.id) {
      declared.push(DeclaredLink {
        counterpart_id: Some(other.id),
        name: Some(other.name.clone()),
        tenure: incoming.tenure.clone(),
      });
    }
  }

  declared
}

/// Filtra y deduplica la lista declarada.
///
/// - sin id → se descarta,
/// - apunta al propio artista → se descarta,
/// - pertenencia con un contraparte del mismo tipo → se descarta,
/// - id repetido → gana la última aparición (se conserva la posición de la
///   primera).
fn normalize_declared(
  next: &[Artist],
  index: &HashMap<ArtistId, usize>,
  edited: &Artist,
  relation: Relation,
  declared: &[DeclaredLink],
) -> Vec<ArtistLink> {
  let mut out: Vec<ArtistLink> = Vec::with_capacity(declared.len());

  for entry in declared {
    let Some(id) = entry.counterpart_id else {
      debug!(artist = %edited.id, %relation, "dropping declared link without counterpart id");
      continue;
    };

    if id == edited.id {
      debug!(artist = %edited.id, %relation, "dropping self relation");
      continue;
    }

    let counterpart = index.get(&id).map(|&i| &next[i]);

    if relation == Relation::Membership {
      if let Some(c) = counterpart.filter(|c| c.kind != edited.kind.complement()) {
        warn!(artist = %edited.id, counterpart = %c.id, kind = %c.kind, "membership requires a solo and a group, skipping");
        continue;
      }
    }

    let name = counterpart
      .map(|c| c.name.clone())
      .or_else(|| entry.name.clone().filter(|n| !n.trim().is_empty()))
      .or_else(|| edited.link_to(relation, id).map(|l| l.name.clone()))
      .unwrap_or_default();

    match out.iter_mut().find(|l| l.artist_id == id) {
      Some(existing) => {
        existing.name = name;
        existing.tenure = entry.tenure.clone();
      }
      None => out.push(ArtistLink::new(id, name, entry.tenure.clone())),
    }
  }

  out
}

/// Actualiza o añade la referencia de vuelta hacia `edited_id`.
///
/// Devuelve `true` si tuvo que añadirla. Si el contraparte tenía la
/// referencia repetida, se queda sólo la primera.
fn upsert_back_reference(
  back: &mut Vec<ArtistLink>,
  edited_id: ArtistId,
  edited_name: &str,
  link: &ArtistLink,
) -> bool {
  let mut seen = false;
  back.retain_mut(|l| {
    if l.artist_id != edited_id {
      return true;
    }
    if seen {
      return false;
    }
    seen = true;
    l.name = edited_name.to_string();
    l.tenure = link.tenure.clone();
    true
  });

  if !seen {
    back.push(ArtistLink::new(edited_id, edited_name, link.tenure.clone()));
  }

  !seen
}
