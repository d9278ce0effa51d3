// Graph card lifecycle: save, list, soft delete, recall

use crate::assemble::GraphAssembler;
use crate::data::Database;
use crate::error::{GraphError, Result};
use crate::model::{CardGraph, GraphCardSummary, NewCard};
use crate::source::LinkSource;
use chrono::Utc;
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;

pub struct GraphPersistence<'a> {
    db: &'a Database,
}

impl<'a> GraphPersistence<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn validate(&self, card: &NewCard) -> Result<()> {
        if card.members.is_empty() {
            return Err(GraphError::InvalidInput(
                "a graph card needs at least one node".to_string(),
            ));
        }

        let mut ordinals = HashSet::new();
        for member in &card.members {
            if !ordinals.insert(member.ordinal) {
                return Err(GraphError::InvalidInput(format!(
                    "ordinal {} is used more than once",
                    member.ordinal
                )));
            }
        }

        let ids: Vec<i64> = card
            .members
            .iter()
            .map(|m| m.node_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let known: HashSet<i64> = self.db.nodes_by_ids(&ids)?.into_iter().map(|p| p.id).collect();
        if let Some(missing) = card.members.iter().find(|m| !known.contains(&m.node_id)) {
            return Err(GraphError::InvalidInput(format!(
                "unknown node {}",
                missing.node_id
            )));
        }
        Ok(())
    }

    /// Stores a new card. The header and every member are committed
    /// together; an existing `card_id` yields `DuplicateIdentity`.
    pub fn save(&self, owner_id: Uuid, card: NewCard) -> Result<GraphCardSummary> {
        self.validate(&card)?;
        self.db.insert_card(owner_id, &card, Utc::now())?;
        info!(
            "Saved graph card {} with {} nodes",
            card.card_id,
            card.members.len()
        );

        self.db
            .card_summary(card.card_id)?
            .ok_or(GraphError::NoSuchCard(card.card_id))
    }

    /// Live cards of the owner, most recent first.
    pub fn list(&self, owner_id: Uuid) -> Result<Vec<GraphCardSummary>> {
        self.db.list_cards(owner_id)
    }

    /// Tombstones the card and returns the owner's remaining cards.
    pub fn soft_delete(&self, owner_id: Uuid, card_id: Uuid) -> Result<Vec<GraphCardSummary>> {
        let affected = self.db.tombstone_card(owner_id, card_id)?;
        if affected == 0 {
            return Err(GraphError::NoSuchCard(card_id));
        }
        info!("Deleted graph card {}", card_id);
        self.db.list_cards(owner_id)
    }

    /// Rebuilds the card's graph from its members in ordinal order.
    pub fn recall(&self, card_id: Uuid) -> Result<CardGraph> {
        let members = self
            .db
            .card_members(card_id)?
            .ok_or(GraphError::NoSuchCard(card_id))?;
        let ids: Vec<i64> = members.iter().map(|m| m.node_id).collect();
        GraphAssembler::new(self.db).expand_members(&ids)
    }
}
