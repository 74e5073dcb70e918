//! Knowledge expansion for plasma construction.
//!
//! Plasma construction only needs one thing from world knowledge: given the
//! stated concepts, which related concepts can be inferred. That contract is
//! [`ConceptExpander`]. [`KnowledgeGraph`] is an in-memory implementation
//! storing each relation as `bind(role, object)` on its subject, so a query
//! unbinds the role and scores the recovered vector against the object.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codebook::{Codebook, Hypervector};
use crate::error::CceResult;

/// Relation name used by [`KnowledgeGraph::find_opposites`].
pub const OPPOSES: &str = "OPPOSES";

/// Relation types known up front. Other names are accepted and encoded lazily.
pub const RELATION_TYPES: [&str; 8] = [
    "ISA", "HAS", "CAUSES", OPPOSES, "PARTOF", "NEEDS", "LEADSTO", "CONTEXT",
];

/// One inferred concept: `source --relation--> inferred`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptExpansion {
    pub source: String,
    pub relation: String,
    pub inferred: String,
}

/// Expands stated concepts into related, inferred concepts.
///
/// Implementations must return at most `max_expansions` entries and must not
/// return an inferred concept already present in `concepts` (compared
/// lowercase), nor the same inferred concept twice.
pub trait ConceptExpander: Send + Sync {
    fn expand_concepts(&self, concepts: &[String], max_expansions: usize) -> Vec<ConceptExpansion>;
}

/// A `{subject, relation, object}` triple as found in knowledge files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationTriple {
    pub subject: String,
    pub relation: String,
    pub object: String,
}

#[derive(Debug, Clone)]
struct Relation {
    kind: String,
    target: String,
    binding: Hypervector,
}

#[derive(Debug, Clone)]
struct KnowledgeNode {
    relations: Vec<Relation>,
}

/// Summary counts for a knowledge graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeStats {
    pub nodes: usize,
    pub relations: usize,
    pub by_type: BTreeMap<String, usize>,
}

/// World knowledge encoded as hypervector bindings.
#[derive(Debug)]
pub struct KnowledgeGraph {
    codebook: Arc<Codebook>,
    nodes: HashMap<String, KnowledgeNode>,
}

impl KnowledgeGraph {
    pub fn new(codebook: Arc<Codebook>) -> Self {
        for relation in RELATION_TYPES {
            codebook.encode(&Self::role_symbol(relation));
        }
        Self {
            codebook,
            nodes: HashMap::new(),
        }
    }

    fn role_symbol(relation: &str) -> String {
        format!("__rel_{}__", relation)
    }

    fn role_vector(&self, relation: &str) -> Hypervector {
        self.codebook.encode(&Self::role_symbol(relation))
    }

    fn node_entry(&mut self, concept: &str) -> &mut KnowledgeNode {
        self.nodes
            .entry(Codebook::normalize(concept))
            .or_insert_with(|| KnowledgeNode {
                relations: Vec::new(),
            })
    }

    /// Add `subject --relation--> object`. Both concepts become nodes.
    pub fn add_relation(&mut self, subject: &str, relation: &str, object: &str) {
        let binding = Codebook::bind(&self.role_vector(relation), &self.codebook.encode(object));
        self.node_entry(object);
        self.node_entry(subject).relations.push(Relation {
            kind: relation.to_string(),
            target: object.to_string(),
            binding,
        });
    }

    /// Add every triple of a JSON array of `{subject, relation, object}`.
    pub fn load_json_str(&mut self, json: &str) -> CceResult<usize> {
        let triples: Vec<RelationTriple> = serde_json::from_str(json)?;
        for t in &triples {
            self.add_relation(&t.subject, &t.relation, &t.object);
        }
        debug!(relations = triples.len(), "loaded knowledge triples");
        Ok(triples.len())
    }

    pub fn contains(&self, concept: &str) -> bool {
        self.nodes.contains_key(&Codebook::normalize(concept))
    }

    /// What does `subject` relate to via `relation`?
    ///
    /// Unbinds the role from each stored binding and scores the recovered
    /// vector against the target, best first.
    pub fn query(&self, subject: &str, relation: &str, top_k: usize) -> Vec<(String, f32)> {
        let Some(node) = self.nodes.get(&Codebook::normalize(subject)) else {
            return Vec::new();
        };
        let role = self.role_vector(relation);
        let mut results: Vec<(String, f32)> = node
            .relations
            .iter()
            .filter(|r| r.kind == relation)
            .map(|r| {
                let recovered = Codebook::bind(&role, &r.binding);
                let sim = Codebook::similarity(&recovered, &self.codebook.encode(&r.target));
                (r.target.clone(), sim)
            })
            .collect();
        results.sort_by(|a, b| b.1.total_cmp(&a.1));
        results.truncate(top_k);
        results
    }

    /// All relations of `concept` as `(relation, target, strength)`.
    pub fn get_related(&self, concept: &str, max_results: usize) -> Vec<(String, String, f32)> {
        let Some(node) = self.nodes.get(&Codebook::normalize(concept)) else {
            return Vec::new();
        };
        node.relations
            .iter()
            .take(max_results)
            .map(|r| {
                let expected = Codebook::bind(&self.role_vector(&r.kind), &self.codebook.encode(&r.target));
                let strength = Codebook::similarity(&r.binding, &expected);
                (r.kind.clone(), r.target.clone(), strength)
            })
            .collect()
    }

    /// Natural antonyms of `concept`.
    pub fn find_opposites(&self, concept: &str) -> Vec<String> {
        self.query(concept, OPPOSES, 5)
            .into_iter()
            .map(|(target, _)| target)
            .collect()
    }

    /// Total number of stored relations.
    pub fn size(&self) -> usize {
        self.nodes.values().map(|n| n.relations.len()).sum()
    }

    pub fn stats(&self) -> KnowledgeStats {
        let mut by_type = BTreeMap::new();
        for node in self.nodes.values() {
            for r in &node.relations {
                *by_type.entry(r.kind.clone()).or_insert(0) += 1;
            }
        }
        KnowledgeStats {
            nodes: self.nodes.len(),
            relations: self.size(),
            by_type,
        }
    }
}

impl ConceptExpander for KnowledgeGraph {
    fn expand_concepts(&self, concepts: &[String], max_expansions: usize) -> Vec<ConceptExpansion> {
        let mut seen: HashSet<String> = concepts.iter().map(|c| Codebook::normalize(c)).collect();
        let mut expansions = Vec::new();

        for concept in concepts {
            let Some(node) = self.nodes.get(&Codebook::normalize(concept)) else {
                continue;
            };
            for r in &node.relations {
                if expansions.len() >= max_expansions {
                    return expansions;
                }
                if seen.insert(Codebook::normalize(&r.target)) {
                    expansions.push(ConceptExpansion {
                        source: concept.clone(),
                        relation: r.kind.clone(),
                        inferred: r.target.clone(),
                    });
                }
            }
        }
        expansions
    }
}
