//! Feature encoding of a (parent, child, position) edge.
//!
//! Every edge becomes a [`Case`]: one value per expanded field, all zero
//! except the position flag and the one-hot columns of the tags involved.
//!
//! Part-of-speech fields are always expanded into one column per tag of
//! [`POS_TAGS`]. Dependency-label fields are kept as a single literal column
//! by default ([`DependencyEncoding::Literal`]): the label columns written by
//! [`FeatureSchema::build_case`] then have no matching field and are dropped,
//! so `child_dep`/`parent_dep` always read 0. Models trained on that layout
//! depend on it. [`DependencyEncoding::OneHot`] expands the labels over
//! [`DEP_LABELS`] instead and is picked up automatically when a model was
//! trained with those columns.

use std::collections::HashMap;

use alpha_protocol::{dep_index, pos_index, Position, DEP_LABELS, POS_TAGS};
use once_cell::sync::Lazy;

use crate::sentence::{Token, TokenData};

/// Base fields, label column first.
pub const CASE_FIELDS: [&str; 6] = [
    "transformation",
    "child_pos",
    "child_dep",
    "parent_pos",
    "parent_dep",
    "child_position",
];

static DEFAULT_SCHEMA: Lazy<FeatureSchema> = Lazy::new(FeatureSchema::default);

/// What a token contributes to a case.
pub trait TokenFeatures {
    fn tag(&self) -> &str;
    fn dep(&self) -> &str;
}

impl TokenFeatures for Token<'_> {
    fn tag(&self) -> &str {
        Token::tag(self)
    }

    fn dep(&self) -> &str {
        Token::dep(self)
    }
}

impl TokenFeatures for TokenData {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn dep(&self) -> &str {
        &self.dep
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DependencyEncoding {
    /// `child_dep` and `parent_dep` stay single, never-set columns.
    #[default]
    Literal,
    /// One column per entry of [`DEP_LABELS`].
    OneHot,
}

/// Ordered field list plus a name index over it.
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    encoding: DependencyEncoding,
    fields: Vec<String>,
    index: HashMap<String, usize>,
    // First column of each expanded family, keyed by base field.
    starts: HashMap<&'static str, usize>,
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::new(DependencyEncoding::default())
    }
}

// Fields and index are derived from the encoding.
impl PartialEq for FeatureSchema {
    fn eq(&self, other: &Self) -> bool {
        self.encoding == other.encoding
    }
}

impl FeatureSchema {
    pub fn new(encoding: DependencyEncoding) -> Self {
        let mut fields = Vec::new();
        let mut starts = HashMap::new();
        for field in CASE_FIELDS {
            if field.ends_with("_pos") {
                starts.insert(field, fields.len());
                fields.extend(generate_fields(field, &POS_TAGS));
            } else if field.ends_with("_dep") && encoding == DependencyEncoding::OneHot {
                starts.insert(field, fields.len());
                fields.extend(generate_fields(field, &DEP_LABELS));
            } else {
                fields.push(field.to_string());
            }
        }
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.clone(), i))
            .collect();

        Self {
            encoding,
            fields,
            index,
            starts,
        }
    }

    /// The schema whose feature columns are exactly `feature_names`.
    pub fn detect(feature_names: &[String]) -> Option<Self> {
        [DependencyEncoding::Literal, DependencyEncoding::OneHot]
            .into_iter()
            .map(Self::new)
            .find(|schema| schema.feature_names() == feature_names)
    }

    pub fn encoding(&self) -> DependencyEncoding {
        self.encoding
    }

    /// All fields, label column included.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Classifier input columns: every field but the label.
    pub fn feature_names(&self) -> &[String] {
        &self.fields[1..]
    }

    pub fn column(&self, field: &str) -> Option<usize> {
        self.index.get(field).copied()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// CSV header line for a training table of this schema.
    pub fn csv_header(&self) -> String {
        self.fields.join(",")
    }

    pub fn build_case<P, C>(&self, parent: &P, child: &C, position: Position) -> Case<'_>
    where
        P: TokenFeatures + ?Sized,
        C: TokenFeatures + ?Sized,
    {
        let mut case = Case {
            schema: self,
            values: vec![0.; self.fields.len()],
        };

        case.set("child_position", position.as_feature());
        case.set_hot("child_pos", pos_index(child.tag()));
        case.set_hot("child_dep", dep_index(child.dep()));
        case.set_hot("parent_pos", pos_index(parent.tag()));
        case.set_hot("parent_dep", dep_index(parent.dep()));

        case
    }

    /// Column of entry `offset` in the expanded family `field`.
    fn family_column(&self, field: &str, offset: usize) -> Option<usize> {
        self.starts.get(field).map(|start| start + offset)
    }
}

fn generate_fields<'a>(prefix: &'a str, values: &'a [&str]) -> impl Iterator<Item = String> + 'a {
    values.iter().map(move |value| format!("{}_{}", prefix, value))
}

/// Field list of the default schema, label column first.
pub fn expanded_fields() -> Vec<String> {
    DEFAULT_SCHEMA.fields().to_vec()
}

/// Encodes an edge with the default schema.
pub fn build_case<P, C>(parent: &P, child: &C, position: Position) -> Case<'static>
where
    P: TokenFeatures + ?Sized,
    C: TokenFeatures + ?Sized,
{
    DEFAULT_SCHEMA.build_case(parent, child, position)
}

/// Field values of one edge, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct Case<'s> {
    schema: &'s FeatureSchema,
    values: Vec<f32>,
}

impl<'s> Case<'s> {
    pub fn schema(&self) -> &'s FeatureSchema {
        self.schema
    }

    pub fn get(&self, field: &str) -> Option<f32> {
        self.schema.column(field).map(|i| self.values[i])
    }

    /// Sets `field` if the schema has such a column; returns whether it did.
    pub fn set(&mut self, field: &str, value: f32) -> bool {
        match self.schema.column(field) {
            Some(i) => {
                self.values[i] = value;
                true
            }
            None => false,
        }
    }

    // Unknown tags and unexpanded families leave every column at 0.
    fn set_hot(&mut self, family: &str, offset: Option<usize>) {
        if let Some(i) = offset.and_then(|o| self.schema.family_column(family, o)) {
            self.values[i] = 1.;
        }
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Classifier input: every value but the label column.
    pub fn features(&self) -> &[f32] {
        &self.values[1..]
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'s str, f32)> + '_ {
        self.schema
            .fields
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}
