//! Ragged nested-list utilities
//!
//! Node evaluation functions receive values that may be a scalar, a flat
//! list, or an arbitrarily deep and uneven nesting of lists. The functions
//! here reshape such values and pair several of them up element by element
//! so a node can be written against single leaves.
//!
//! Any non-list value is a leaf. `Value::Wrapped` is also a leaf, which is
//! how a list-valued payload opts out of being treated as nesting.
//!
//! # Broadcasting
//!
//! [`broadcast`] aligns its inputs from the outermost level inward:
//!
//! - a leaf pairs with every element of the other inputs at that level
//! - lists of equal length zip elementwise
//! - a one-element list repeats against a longer list
//! - any other length disagreement is a [`ShapeMismatch`]
//!
//! The result carries one flat index tuple per output leaf plus a
//! [`Structure`] that rebuilds the result's nesting from those tuples.

use serde::{Deserialize, Serialize};

use crate::error::{CodeLinkError, EvaluationError, Result, ShapeMismatch};
use crate::value::Value;

/// Ragged nested-index descriptor
///
/// Each `Leaf` holds an offset into a flat data sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Structure {
    Leaf(usize),
    List(Vec<Structure>),
}

impl Structure {
    /// Nesting depth; a bare leaf is 0 and an empty list is 1
    pub fn depth(&self) -> usize {
        match self {
            Structure::Leaf(_) => 0,
            Structure::List(items) => 1 + items.iter().map(Structure::depth).max().unwrap_or(0),
        }
    }

    /// Leaf offsets in depth-first order
    pub fn indices(&self) -> Vec<usize> {
        let mut out = Vec::new();
        self.collect_indices(&mut out);
        out
    }

    fn collect_indices(&self, out: &mut Vec<usize>) {
        match self {
            Structure::Leaf(i) => out.push(*i),
            Structure::List(items) => items.iter().for_each(|item| item.collect_indices(out)),
        }
    }

    /// Wrap every leaf in its own singleton list
    pub fn graft(&self) -> Structure {
        match self {
            Structure::Leaf(i) => Structure::List(vec![Structure::Leaf(*i)]),
            Structure::List(items) => Structure::List(items.iter().map(Structure::graft).collect()),
        }
    }
}

/// Flat payload plus the structure that regroups it
#[derive(Debug, Clone, PartialEq)]
pub struct NestedData {
    data: Vec<Value>,
    structure: Structure,
}

impl NestedData {
    /// Pair `data` with `structure`
    ///
    /// Fails with `InvalidStructure` when a leaf offset is out of range.
    pub fn new(data: Vec<Value>, structure: Structure) -> Result<Self> {
        if let Some(bad) = structure.indices().into_iter().find(|&i| i >= data.len()) {
            return Err(CodeLinkError::InvalidStructure(format!(
                "offset {} outside data of length {}",
                bad,
                data.len()
            )));
        }
        Ok(Self { data, structure })
    }

    pub fn data(&self) -> &[Value] {
        &self.data
    }

    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    /// Nesting depth seen by consuming nodes
    pub fn rank(&self) -> usize {
        self.structure.depth()
    }

    /// Graft the structure; the flat payload is shared untouched
    pub fn graft_topology(&self) -> NestedData {
        NestedData {
            data: self.data.clone(),
            structure: self.structure.graft(),
        }
    }

    /// Collapse singleton levels of the structure
    pub fn simplify(&self) -> NestedData {
        NestedData {
            data: self.data.clone(),
            structure: simplify_record(&self.structure),
        }
    }

    /// Rebuild the nested value
    pub fn to_value(&self) -> Value {
        build(&self.structure, &|i| self.data[i].clone())
    }
}

fn build(structure: &Structure, leaf: &dyn Fn(usize) -> Value) -> Value {
    match structure {
        Structure::Leaf(i) => leaf(*i),
        Structure::List(items) => Value::List(items.iter().map(|s| build(s, leaf)).collect()),
    }
}

/// Nesting depth of a value; leaves are 0
pub fn depth(x: &Value) -> usize {
    match x {
        Value::List(items) => 1 + items.iter().map(depth).max().unwrap_or(0),
        _ => 0,
    }
}

/// All leaves, depth-first and left to right
pub fn flatten(x: &Value) -> Vec<Value> {
    let mut out = Vec::new();
    let mut stack = vec![x];
    while let Some(item) = stack.pop() {
        match item {
            Value::List(items) => stack.extend(items.iter().rev()),
            leaf => out.push(leaf.clone()),
        }
    }
    out
}

/// Collapse singleton lists into their element, at every level
pub fn simplify(x: &Value) -> Value {
    match x {
        Value::List(items) => {
            let mut items: Vec<Value> = items.iter().map(simplify).collect();
            if items.len() == 1 {
                items.remove(0)
            } else {
                Value::List(items)
            }
        }
        leaf => leaf.clone(),
    }
}

/// Wrap every leaf in its own singleton list
pub fn graft(x: &Value) -> Value {
    match x {
        Value::List(items) => Value::List(items.iter().map(graft).collect()),
        leaf => Value::List(vec![leaf.clone()]),
    }
}

/// Graft by rewriting the recorded structure and rebuilding from the flat data
pub fn graft_topology(x: &Value) -> Value {
    flatten_record(x).graft_topology().to_value()
}

/// Protect `x` from being treated as nesting
pub fn wrap(x: &Value) -> Value {
    Value::Wrapped(Box::new(x.clone()))
}

/// Strip one sentinel layer from every wrapped leaf
pub fn unwrap(x: &Value) -> Value {
    match x {
        Value::Wrapped(inner) => (**inner).clone(),
        Value::List(items) => Value::List(items.iter().map(unwrap).collect()),
        leaf => leaf.clone(),
    }
}

/// Follow `path` through nested lists
pub fn get_path<'a>(x: &'a Value, path: &[usize]) -> Option<&'a Value> {
    path.iter().try_fold(x, |current, &i| current.as_list()?.get(i))
}

/// Record the shape of `x` with leaves numbered in flatten order
pub fn record_structure(x: &Value) -> Structure {
    fn walk(x: &Value, next: &mut usize) -> Structure {
        match x {
            Value::List(items) => Structure::List(items.iter().map(|i| walk(i, next)).collect()),
            _ => {
                let leaf = Structure::Leaf(*next);
                *next += 1;
                leaf
            }
        }
    }
    walk(x, &mut 0)
}

/// Split `x` into its flat leaves and their structure
pub fn flatten_record(x: &Value) -> NestedData {
    NestedData {
        data: flatten(x),
        structure: record_structure(x),
    }
}

/// Rebuild a nested value from flat `data` shaped like `structure`
pub fn unflatten_array_like(data: &[Value], structure: &Structure) -> Result<Value> {
    let nested = NestedData::new(data.to_vec(), structure.clone())?;
    Ok(nested.to_value())
}

/// Collapse singleton levels of a structure descriptor
pub fn simplify_record(structure: &Structure) -> Structure {
    match structure {
        Structure::Leaf(i) => Structure::Leaf(*i),
        Structure::List(items) => {
            let mut items: Vec<Structure> = items.iter().map(simplify_record).collect();
            if items.len() == 1 {
                items.remove(0)
            } else {
                Structure::List(items)
            }
        }
    }
}

/// Result of pairing up several nested values
#[derive(Debug, Clone, PartialEq)]
pub struct Broadcast {
    /// One flat leaf sequence per input
    pub flats: Vec<Vec<Value>>,
    /// One tuple per result leaf: offsets into each of `flats`
    pub tuples: Vec<Vec<usize>>,
    /// Shape of the result; leaf offsets index into `tuples`
    pub structure: Structure,
}

impl Broadcast {
    /// The leaves paired up at `tuple`
    pub fn leaves(&self, tuple: usize) -> Vec<&Value> {
        self.tuples[tuple]
            .iter()
            .zip(&self.flats)
            .map(|(&offset, flat)| &flat[offset])
            .collect()
    }
}

/// Pair up `inputs` element by element
pub fn broadcast(inputs: &[&Value]) -> std::result::Result<Broadcast, ShapeMismatch> {
    let records: Vec<NestedData> = inputs.iter().map(|x| flatten_record(x)).collect();
    let structures: Vec<&Structure> = records.iter().map(|r| &r.structure).collect();

    let mut tuples = Vec::new();
    let structure = align(&structures, 0, &mut tuples)?;

    Ok(Broadcast {
        flats: records.into_iter().map(|r| r.data).collect(),
        tuples,
        structure,
    })
}

fn align(
    structures: &[&Structure],
    level: usize,
    tuples: &mut Vec<Vec<usize>>,
) -> std::result::Result<Structure, ShapeMismatch> {
    let mut len: Option<usize> = None;
    let mut any_list = false;
    for s in structures {
        let Structure::List(items) = s else {
            continue;
        };
        any_list = true;
        let n = items.len();
        match len {
            _ if n == 1 => {}
            None => len = Some(n),
            Some(m) if m == n => {}
            Some(m) => {
                return Err(ShapeMismatch {
                    depth: level,
                    left: m,
                    right: n,
                })
            }
        }
    }

    if !any_list {
        let tuple = structures
            .iter()
            .map(|s| match s {
                Structure::Leaf(i) => *i,
                Structure::List(_) => 0,
            })
            .collect();
        tuples.push(tuple);
        return Ok(Structure::Leaf(tuples.len() - 1));
    }

    let len = len.unwrap_or(1);
    let mut children = Vec::with_capacity(len);
    for i in 0..len {
        let row: Vec<&Structure> = structures
            .iter()
            .map(|s| match s {
                Structure::List(items) if items.len() == 1 => &items[0],
                Structure::List(items) => &items[i],
                leaf => *leaf,
            })
            .collect();
        children.push(align(&row, level + 1, tuples)?);
    }
    Ok(Structure::List(children))
}

/// Broadcast `inputs` and apply `f` to every paired tuple of leaves
///
/// The result has the broadcast shape with `f`'s outputs at the leaves.
pub fn zip_map<F>(inputs: &[&Value], mut f: F) -> std::result::Result<Value, EvaluationError>
where
    F: FnMut(&[&Value]) -> std::result::Result<Value, EvaluationError>,
{
    let plan = broadcast(inputs)?;
    let results = (0..plan.tuples.len())
        .map(|t| f(&plan.leaves(t)))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(build(&plan.structure, &|i| results[i].clone()))
}
