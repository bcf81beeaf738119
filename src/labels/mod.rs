mod loader;

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;

pub use loader::{load_builtin_v1, load_label_tsv, parse_label_tsv};

use crate::error::EvalError;

pub const METRIC_NAMES: [&str; 6] = ["1-Dice", "1-Jaccard", "SRVD", "AVD", "ASSD", "RMSD"];

pub const KIDNEY: &str = "kidney";
pub const URETER: &str = "ureter";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseClass {
    pub id: u8,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hec {
    pub name: String,
    pub labels: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct LabelDefs {
    pub classes: Vec<BaseClass>,
    pub hecs: Vec<Hec>,
    pub construction_order: Vec<u8>,
}

/// Base classes, HECs and painting order. The ordered lists are authoritative;
/// every matrix in the crate is indexed by `hecs()` position.
#[derive(Debug, Clone)]
pub struct LabelRegistry {
    version: String,
    classes: Vec<BaseClass>,
    hecs: Vec<Hec>,
    construction_order: Vec<u8>,
    name_index: HashMap<String, u8>,
    id_index: HashMap<u8, usize>,
    hec_index: HashMap<String, usize>,
}

impl LabelRegistry {
    pub fn builtin() -> Result<Self> {
        let defs = load_builtin_v1().map_err(|e| EvalError::config(format!("{e:#}")))?;
        Ok(Self::from_defs("kits21_v1", defs)?)
    }

    pub fn from_tsv(path: &Path) -> Result<Self> {
        let defs = load_label_tsv(path).map_err(|e| EvalError::config(format!("{e:#}")))?;
        Ok(Self::from_defs(&path.display().to_string(), defs)?)
    }

    /// The user table when one is given, the built-in one otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_tsv(p),
            None => Self::builtin(),
        }
    }

    pub fn from_defs(version: &str, defs: LabelDefs) -> Result<Self, EvalError> {
        let LabelDefs {
            classes,
            hecs,
            construction_order,
        } = defs;
        if classes.is_empty() {
            return Err(EvalError::config("label table defines no base classes"));
        }
        if hecs.is_empty() {
            return Err(EvalError::config("label table defines no HECs"));
        }

        let mut name_index = HashMap::new();
        let mut id_index = HashMap::new();
        for (pos, class) in classes.iter().enumerate() {
            if class.id == 0 {
                return Err(EvalError::config(format!(
                    "class '{}' uses id 0, which is reserved for background",
                    class.name
                )));
            }
            if id_index.insert(class.id, pos).is_some() {
                return Err(EvalError::config(format!("duplicate class id {}", class.id)));
            }
            if name_index.insert(class.name.clone(), class.id).is_some() {
                return Err(EvalError::config(format!(
                    "duplicate class name '{}'",
                    class.name
                )));
            }
        }

        let mut hec_index = HashMap::new();
        for (pos, hec) in hecs.iter().enumerate() {
            if hec.labels.is_empty() {
                return Err(EvalError::config(format!("HEC '{}' has no labels", hec.name)));
            }
            for id in &hec.labels {
                if !id_index.contains_key(id) {
                    return Err(EvalError::config(format!(
                        "HEC '{}' references unknown class id {}",
                        hec.name, id
                    )));
                }
            }
            if hec_index.insert(hec.name.clone(), pos).is_some() {
                return Err(EvalError::config(format!("duplicate HEC name '{}'", hec.name)));
            }
        }

        let mut seen = construction_order.clone();
        seen.sort_unstable();
        seen.dedup();
        let mut ids: Vec<u8> = classes.iter().map(|c| c.id).collect();
        ids.sort_unstable();
        if seen.len() != construction_order.len() || seen != ids {
            return Err(EvalError::config(format!(
                "construction order {:?} is not a permutation of class ids {:?}",
                construction_order, ids
            )));
        }

        Ok(Self {
            version: version.to_string(),
            classes,
            hecs,
            construction_order,
            name_index,
            id_index,
            hec_index,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn classes(&self) -> &[BaseClass] {
        &self.classes
    }

    pub fn hecs(&self) -> &[Hec] {
        &self.hecs
    }

    pub fn hec_names(&self) -> Vec<String> {
        self.hecs.iter().map(|h| h.name.clone()).collect()
    }

    pub fn hec(&self, name: &str) -> Option<&Hec> {
        self.hec_index.get(name).map(|&pos| &self.hecs[pos])
    }

    pub fn hec_index(&self, name: &str) -> Option<usize> {
        self.hec_index.get(name).copied()
    }

    pub fn class_id(&self, name: &str) -> Option<u8> {
        self.name_index.get(name).copied()
    }

    pub fn class_name(&self, id: u8) -> Option<&str> {
        self.id_index
            .get(&id)
            .map(|&pos| self.classes[pos].name.as_str())
    }

    pub fn construction_order(&self) -> &[u8] {
        &self.construction_order
    }
}
