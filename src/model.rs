//! Project and subtask records as supplied by the host.
//!
//! These are read-only inputs to the layout and interaction code. The host owns
//! them and is the only place they are mutated.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::geometry::{radius_for_priority, PointF};

/// Id of the derived center node. Never a key in the position map.
pub const CENTER_NODE_ID: &str = "center";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "PriorityLabel")]
pub enum Priority {
    High,
    Medium,
    #[default]
    Low,
}

impl Priority {
    /// Parse a priority label. Accepts the English names and the
    /// single-character Korean labels; anything else is `Low`.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "high" | "High" | "HIGH" | "상" => Priority::High,
            "medium" | "Medium" | "MEDIUM" | "중" => Priority::Medium,
            _ => Priority::Low,
        }
    }

    pub fn radius(self) -> f64 {
        radius_for_priority(self)
    }
}

impl From<String> for Priority {
    fn from(label: String) -> Self {
        Priority::from_label(&label)
    }
}

/// Any JSON value in a priority field. Non-strings (`null`, numbers) read as
/// `Low` instead of failing the whole record.
#[derive(Deserialize)]
#[serde(untagged)]
enum PriorityLabel {
    Text(String),
    Other(serde::de::IgnoredAny),
}

impl From<PriorityLabel> for Priority {
    fn from(label: PriorityLabel) -> Self {
        match label {
            PriorityLabel::Text(text) => Priority::from_label(&text),
            PriorityLabel::Other(_) => Priority::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Subtask {
    pub fn new(id: impl Into<String>, title: impl Into<String>, priority: Priority) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            priority,
            progress: 0,
            deadline: None,
            start_date: None,
            end_date: None,
            description: None,
        }
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = progress.min(100);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

impl Project {
    pub fn new(title: impl Into<String>, priority: Priority) -> Self {
        Self {
            id: None,
            title: title.into(),
            priority,
            progress: 0,
            deadline: None,
            description: None,
            subtasks: Vec::new(),
        }
    }

    pub fn subtask(&self, id: &str) -> Option<&Subtask> {
        self.subtasks.iter().find(|s| s.id == id)
    }
}

/// Stored placement of one subtask node, in local diagram space.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl PositionRecord {
    pub fn new(x: f64, y: f64, radius: f64) -> Self {
        Self { x, y, radius }
    }

    pub fn point(&self) -> PointF {
        PointF { x: self.x, y: self.y }
    }
}

/// Position records keyed by subtask id.
pub type PositionMap = HashMap<String, PositionRecord>;
