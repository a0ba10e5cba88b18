use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Reads an attribute object in source order, dropping null and empty entries.
/// Recorded snapshots carry `null` for attributes that were read but absent.
struct AttributeMapVisitor;

impl<'de> Visitor<'de> for AttributeMapVisitor {
    type Value = AttributeMap;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of attribute names to string or null values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<AttributeMap, A::Error> {
        let mut map = AttributeMap::new();
        while let Some((name, value)) = access.next_entry::<String, Option<String>>()? {
            if let Some(value) = value {
                map.insert(name, value);
            }
        }
        Ok(map)
    }
}

/// Opaque, non-owning reference to an element in a document tree.
///
/// Only meaningful together with the tree that issued it, and only for the
/// duration of one engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementHandle(u32);

impl ElementHandle {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Ordered attribute name/value pairs. Entries with an empty name or value are
/// never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap(Vec<(String, String)>);

impl Serialize for AttributeMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for AttributeMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(AttributeMapVisitor)
    }
}

impl AttributeMap {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut map = Self::new();
        for (name, value) in pairs {
            map.insert(name, value);
        }
        map
    }

    /// Insert or replace an attribute, keeping the original position on replace.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if name.is_empty() || value.is_empty() {
            return;
        }
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Intersection-over-union of two rectangles, 0.0 when they do not touch.
    pub fn overlap_ratio(&self, other: &Rect) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        if x2 < x1 || y2 < y1 {
            return 0.0;
        }

        let intersection = (x2 - x1) * (y2 - y1);
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            return 0.0;
        }
        intersection / union
    }
}

/// Page-relative box of a picked grid, in the shape the picker reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
}

impl From<Rect> for BoundingBox {
    fn from(rect: Rect) -> Self {
        Self {
            top: rect.y,
            left: rect.x,
            width: rect.width,
            height: rect.height,
        }
    }
}

/// Everything the context reader extracts from one element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementContext {
    pub tag: String,
    #[serde(default)]
    pub attributes: AttributeMap,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect: Option<Rect>,
}

impl ElementContext {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name)
    }
}

/// How a selector candidate was synthesized, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectorStrategy {
    Id,
    #[serde(rename = "testid")]
    TestId,
    AriaLabel,
    Name,
    Placeholder,
    TextShorthand,
    StructuralPath,
}

impl SelectorStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            SelectorStrategy::Id => "id",
            SelectorStrategy::TestId => "testid",
            SelectorStrategy::AriaLabel => "ariaLabel",
            SelectorStrategy::Name => "name",
            SelectorStrategy::Placeholder => "placeholder",
            SelectorStrategy::TextShorthand => "textShorthand",
            SelectorStrategy::StructuralPath => "structuralPath",
        }
    }

    /// Confidence of a candidate of this strategy that matched exactly one element.
    pub fn base_confidence(&self) -> i32 {
        match self {
            SelectorStrategy::Id => 100,
            SelectorStrategy::TestId => 95,
            SelectorStrategy::AriaLabel => 90,
            SelectorStrategy::Name => 80,
            SelectorStrategy::Placeholder => 70,
            SelectorStrategy::TextShorthand => 60,
            SelectorStrategy::StructuralPath => 40,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorCandidate {
    pub strategy: SelectorStrategy,
    pub selector: String,
    pub confidence: i32,
}

impl SelectorCandidate {
    pub fn new(strategy: SelectorStrategy, selector: impl Into<String>, confidence: i32) -> Self {
        Self {
            strategy,
            selector: selector.into(),
            confidence,
        }
    }
}

/// Candidates for one element, highest confidence first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorResult {
    pub selectors: Vec<SelectorCandidate>,
}

impl SelectorResult {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a result, ordering candidates by descending confidence. Ties keep
    /// their generation order.
    pub fn from_candidates(mut selectors: Vec<SelectorCandidate>) -> Self {
        selectors.sort_by(|a, b| b.confidence.cmp(&a.confidence));
        Self { selectors }
    }

    pub fn primary(&self) -> Option<&SelectorCandidate> {
        self.selectors.first()
    }

    /// Primary selector string, empty when nothing could be resolved.
    pub fn primary_selector(&self) -> &str {
        self.primary().map(|c| c.selector.as_str()).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }
}

/// Closed column type taxonomy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    #[default]
    Text,
    Number,
    Boolean,
    Date,
    #[serde(alias = "img")]
    Image,
    TextWithDate,
}

impl ColumnType {
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Number => "number",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
            ColumnType::Image => "image",
            ColumnType::TextWithDate => "text_with_date",
        }
    }
}

/// Shape of a date embedded in free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateFormat {
    #[serde(rename = "dd/MM/yyyy")]
    DayMonthYear,
    #[serde(rename = "yyyy-MM-dd")]
    IsoDate,
    #[serde(rename = "dd-MMM-yyyy")]
    DayAbbrevMonthYear,
    #[serde(rename = "MMMM d, yyyy")]
    MonthNameDayYear,
    #[serde(rename = "unknown")]
    Unknown,
}

impl DateFormat {
    pub fn pattern(&self) -> &'static str {
        match self {
            DateFormat::DayMonthYear => "dd/MM/yyyy",
            DateFormat::IsoDate => "yyyy-MM-dd",
            DateFormat::DayAbbrevMonthYear => "dd-MMM-yyyy",
            DateFormat::MonthNameDayYear => "MMMM d, yyyy",
            DateFormat::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    #[default]
    Date,
}

/// A structured value extracted from free-text cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub variable_type: VariableType,
    pub format: DateFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub header: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<VariableDescriptor>>,
}

impl ColumnDescriptor {
    pub fn new(header: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            header: header.into(),
            column_type,
            variables: None,
        }
    }
}

/// Where a column's cell lives relative to its row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMapping {
    pub header: String,
    pub column_index: usize,
    pub selector: String,
}

/// One-shot schema snapshot of a picked grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridDescriptor {
    pub selector: String,
    pub bounding_box: BoundingBox,
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_samples: Option<Vec<Vec<String>>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub row_selector: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub column_mappings: Vec<ColumnMapping>,
}

/// What the recorder captured about an element at interaction time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedElement {
    #[serde(default, alias = "tag")]
    pub tag_name: String,
    #[serde(default)]
    pub attributes: AttributeMap,
    #[serde(default)]
    pub class_list: Vec<String>,
    #[serde(default, alias = "innerText")]
    pub element_text: Option<String>,
    #[serde(default, alias = "domPath")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<Rect>,
}

/// Node of a recorded DOM snapshot tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomSnapshot {
    pub tag: String,
    #[serde(default)]
    pub attributes: AttributeMap,
    /// Text that precedes the node's children.
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<Rect>,
    #[serde(default)]
    pub children: Vec<DomSnapshot>,
}
