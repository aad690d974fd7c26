//! I/O 支持：JSON、RON 序列化接口以及网描述文件的加载.
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use indexmap::IndexMap;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::net::core::{Net, NetError};
use crate::net::structure::{Effect, Marking, Tokens};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ron error: {0}")]
    Ron(#[from] ron::Error),
    #[error("ron error: {0}")]
    RonSpanned(#[from] ron::error::SpannedError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid net description: {0}")]
    Net(#[from] NetError),
}

pub fn to_json_string<T>(value: &T) -> Result<String, IoError>
where
    T: Serialize,
{
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn from_json_str<T>(s: &str) -> Result<T, IoError>
where
    T: DeserializeOwned,
{
    Ok(serde_json::from_str(s)?)
}

pub fn write_json<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<(), IoError> {
    let mut file = File::create(path)?;
    let content = to_json_string(value)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

pub fn read_json<P: AsRef<Path>, T: DeserializeOwned>(path: P) -> Result<T, IoError> {
    let mut file = File::open(path)?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    from_json_str(&content)
}

pub fn to_ron_string<T>(value: &T) -> Result<String, IoError>
where
    T: Serialize,
{
    Ok(ron::ser::to_string_pretty(value, PrettyConfig::default())?)
}

pub fn from_ron_str<T>(s: &str) -> Result<T, IoError>
where
    T: DeserializeOwned,
{
    Ok(ron::from_str(s)?)
}

pub fn write_ron<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<(), IoError> {
    let mut file = File::create(path)?;
    let content = to_ron_string(value)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

pub fn read_ron<P: AsRef<Path>, T: DeserializeOwned>(path: P) -> Result<T, IoError> {
    let mut file = File::open(path)?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    from_ron_str(&content)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDescription {
    pub name: String,
    pub label: String,
    /// Arc vector, aligned with [`NetDescription::places`].
    pub effect: Vec<Effect>,
}

/// 外部网描述：库所、带标签与弧向量的迁移、初始标识与禁止区域生成元.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetDescription {
    pub places: Vec<String>,
    pub transitions: Vec<TransitionDescription>,
    #[serde(default)]
    pub initial: Vec<Tokens>,
    #[serde(default)]
    pub forbidden: Vec<Vec<Tokens>>,
}

/// A validated net together with the markings a complementation run needs.
#[derive(Debug, Clone)]
pub struct Problem {
    pub net: Net,
    pub initial: Marking,
    pub forbidden: Vec<Marking>,
}

impl NetDescription {
    pub fn to_net(&self) -> Result<Net, NetError> {
        let arcs: IndexMap<String, Vec<Effect>> = self
            .transitions
            .iter()
            .map(|t| (t.name.clone(), t.effect.clone()))
            .collect();
        let labeling: IndexMap<String, String> = self
            .transitions
            .iter()
            .map(|t| (t.name.clone(), t.label.clone()))
            .collect();
        Net::from_parts(
            self.places.iter().cloned(),
            self.transitions.iter().map(|t| t.name.clone()),
            &arcs,
            &labeling,
        )
    }

    pub fn into_problem(self) -> Result<Problem, NetError> {
        let net = self.to_net()?;
        let initial = net.marking(&self.initial)?;
        let forbidden = self
            .forbidden
            .iter()
            .map(|generator| net.marking(generator))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Problem {
            net,
            initial,
            forbidden,
        })
    }

    /// Reads a description, picking RON for `.ron` files and JSON otherwise.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, IoError> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("ron") => read_ron(path),
            _ => read_json(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEQUENCE_JSON: &str = r#"{
        "places": ["s", "p"],
        "transitions": [
            { "name": "t", "label": "a", "effect": [-1, 1] }
        ],
        "initial": [1, 0],
        "forbidden": [[0, 1]]
    }"#;

    #[test]
    fn json_description_builds_problem() {
        let description: NetDescription = from_json_str(SEQUENCE_JSON).unwrap();
        let problem = description.into_problem().unwrap();

        assert_eq!(problem.net.places_len(), 2);
        assert_eq!(problem.net.label(crate::net::TransitionId::new(0)), "a");
        assert_eq!(problem.initial, Marking::from_tokens(vec![1, 0]));
        assert_eq!(problem.forbidden, vec![Marking::from_tokens(vec![0, 1])]);
    }

    #[test]
    fn ron_description_matches_json() {
        let description: NetDescription = from_json_str(SEQUENCE_JSON).unwrap();
        let ron = to_ron_string(&description).unwrap();
        let reparsed: NetDescription = from_ron_str(&ron).unwrap();

        assert_eq!(reparsed, description);
    }

    #[test]
    fn initial_marking_must_match_places() {
        let mut description: NetDescription = from_json_str(SEQUENCE_JSON).unwrap();
        description.initial = vec![1];

        assert_eq!(
            description.into_problem().unwrap_err(),
            NetError::DimensionMismatch {
                expected: 2,
                found: 1
            }
        );
    }
}
