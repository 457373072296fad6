//! Serialized regression models and single-row inference

use crate::feature_aligner::AlignedRow;
use crate::models::aggregator::{weighted_mean, Aggregation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Reasons a model could not produce a prediction for a row
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("model references feature '{0}' which the row does not have")]
    UnknownFeature(String),

    #[error("tree {tree} points at node {node} but has {len} nodes")]
    NodeOutOfRange { tree: usize, node: usize, len: usize },

    #[error("tree {tree} does not reach a leaf")]
    NoLeafReached { tree: usize },

    #[error("ensemble has no members")]
    EmptyEnsemble,

    #[error("member weights sum to zero")]
    ZeroWeight,

    #[error("model '{member}' failed: {source}")]
    Member {
        member: String,
        #[source]
        source: Box<InferenceError>,
    },

    #[error("model produced a non-finite value ({0})")]
    NonFinite(f64),
}

/// Anything that maps one aligned row to one scalar.
pub trait Regressor {
    fn predict_row(&self, row: &AlignedRow<'_>) -> Result<f64, InferenceError>;
}

/// A deserialized model artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Model {
    Linear(LinearModel),
    TreeEnsemble(TreeEnsemble),
    Voting(VotingModel),
}

impl Model {
    pub fn kind(&self) -> &'static str {
        match self {
            Model::Linear(_) => "linear",
            Model::TreeEnsemble(_) => "tree_ensemble",
            Model::Voting(_) => "voting",
        }
    }
}

impl Regressor for Model {
    fn predict_row(&self, row: &AlignedRow<'_>) -> Result<f64, InferenceError> {
        match self {
            Model::Linear(m) => m.predict_row(row),
            Model::TreeEnsemble(m) => m.predict_row(row),
            Model::Voting(m) => m.predict_row(row),
        }
    }
}

/// `intercept + Σ coefficient · feature`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    #[serde(default)]
    pub intercept: f64,
    pub coefficients: BTreeMap<String, f64>,
}

impl Regressor for LinearModel {
    fn predict_row(&self, row: &AlignedRow<'_>) -> Result<f64, InferenceError> {
        self.coefficients
            .iter()
            .try_fold(self.intercept, |acc, (feature, weight)| {
                row.get(feature)
                    .map(|x| acc + weight * x)
                    .ok_or_else(|| InferenceError::UnknownFeature(feature.clone()))
            })
    }
}

/// One node of a flattened decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// `row[feature] <= threshold` goes left
    Split {
        feature: String,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Decision tree stored as a node array, root at index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    fn evaluate(&self, index: usize, row: &AlignedRow<'_>) -> Result<f64, InferenceError> {
        let mut current = 0;

        // A well-formed tree reaches a leaf within as many steps as it has nodes
        for _ in 0..=self.nodes.len() {
            let node = self.nodes.get(current).ok_or(InferenceError::NodeOutOfRange {
                tree: index,
                node: current,
                len: self.nodes.len(),
            })?;

            match node {
                Node::Leaf { value } => return Ok(*value),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let x = row
                        .get(feature)
                        .ok_or_else(|| InferenceError::UnknownFeature(feature.clone()))?;
                    current = if x <= *threshold { *left } else { *right };
                }
            }
        }

        Err(InferenceError::NoLeafReached { tree: index })
    }
}

/// Boosted trees or a random forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    #[serde(default)]
    pub base_score: f64,
    #[serde(default)]
    pub aggregation: Aggregation,
    pub trees: Vec<Tree>,
}

impl Regressor for TreeEnsemble {
    fn predict_row(&self, row: &AlignedRow<'_>) -> Result<f64, InferenceError> {
        if self.trees.is_empty() {
            return Err(InferenceError::EmptyEnsemble);
        }

        let outputs = self
            .trees
            .iter()
            .enumerate()
            .map(|(i, tree)| tree.evaluate(i, row))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.base_score + self.aggregation.combine(&outputs))
    }
}

/// Named, weighted member of a voting ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VotingMember {
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    pub model: Model,
}

fn default_weight() -> f64 {
    1.0
}

/// Weighted average over several models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VotingModel {
    pub members: Vec<VotingMember>,
}

impl Regressor for VotingModel {
    fn predict_row(&self, row: &AlignedRow<'_>) -> Result<f64, InferenceError> {
        if self.members.is_empty() {
            return Err(InferenceError::EmptyEnsemble);
        }

        let mut outputs = Vec::with_capacity(self.members.len());
        for member in &self.members {
            let prediction =
                member
                    .model
                    .predict_row(row)
                    .map_err(|e| InferenceError::Member {
                        member: member.name.clone(),
                        source: Box::new(e),
                    })?;
            outputs.push((member.weight, prediction));
        }

        weighted_mean(&outputs).ok_or(InferenceError::ZeroWeight)
    }
}
