use hoard_files_derive_parseable::Parse;

use crate::codec::types::{Gid, gid};
use crate::node::tree::NodeId;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Parse)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Copy, Clone, PartialEq, Default, Parse)]
pub struct Pointf {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Parse)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Parse)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Edges, used both for bounds and for margins.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Parse)]
pub struct Edges {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    Int(i32),
    Float(f32),
    Text(String),
    Point(Point),
    Pointf(Pointf),
    Size(Size),
    Rectangle(Rectangle),
    Bounds(Edges),
    Margins(Edges),
    /// A resource stored inline, it lives on as a child of the data array. `None` if its chunk
    /// was empty or nobody could load it.
    Object(Option<NodeId>),
}

impl DataValue {
    pub fn gid(&self) -> Gid {
        match self {
            DataValue::Int(_) => gid::DATA_INT,
            DataValue::Float(_) => gid::DATA_FLOAT,
            DataValue::Text(_) => gid::DATA_TEXT,
            DataValue::Point(_) => gid::DATA_POINT,
            DataValue::Pointf(_) => gid::DATA_POINTF,
            DataValue::Size(_) => gid::DATA_SIZE,
            DataValue::Rectangle(_) => gid::DATA_RECTANGLE,
            DataValue::Bounds(_) => gid::DATA_BOUNDS,
            DataValue::Margins(_) => gid::DATA_MARGINS,
            DataValue::Object(_) => gid::DATA_OBJECT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataItem {
    pub name: String,
    pub value: DataValue,
}

/// An ordered list of named, typed values.
#[derive(Debug, Default)]
pub struct DataArray {
    items: Vec<DataItem>,
}

impl DataArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: DataValue) {
        self.items.push(DataItem {
            name: name.into(),
            value,
        });
    }

    pub fn items(&self) -> &[DataItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The first item called `name`.
    pub fn get(&self, name: &str) -> Option<&DataValue> {
        self.items.iter().find(|item| item.name == name).map(|item| &item.value)
    }
}
