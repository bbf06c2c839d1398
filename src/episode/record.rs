//! Persisted episode record and its two interchangeable encodings.
//!
//! The JSON form is for humans and analysis scripts; the binary form is a
//! single length-delimited protobuf message. Both decode to the same
//! [`EpisodeRecord`].

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use prost::Message;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{OffsetDateTime, format_description};

use crate::control::ActionBranch;
use crate::infra::EntityId;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("cannot access replay log {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON replay log: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed binary replay log: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("unrecognised replay log format '{0}'")]
    UnknownFormat(String),
    #[error("unknown action branch '{0}'")]
    UnknownBranch(String),
    #[error("unknown win condition '{0}'")]
    UnknownWinCondition(String),
    #[error("invalid playback speed '{0}'")]
    InvalidSpeed(String),
}

/// Terminal condition of an episode.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum WinCondition {
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "party")]
    Party,
    #[serde(rename = "boss")]
    Boss,
    #[serde(rename = "timeout")]
    Timeout,
}

impl WinCondition {
    pub fn as_str(self) -> &'static str {
        match self {
            WinCondition::None => "",
            WinCondition::Party => "party",
            WinCondition::Boss => "boss",
            WinCondition::Timeout => "timeout",
        }
    }
}

impl FromStr for WinCondition {
    type Err = ReplayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(WinCondition::None),
            "party" => Ok(WinCondition::Party),
            "boss" => Ok(WinCondition::Boss),
            "timeout" => Ok(WinCondition::Timeout),
            other => Err(ReplayError::UnknownWinCondition(other.to_string())),
        }
    }
}

impl fmt::Display for WinCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded branch value of one agent in one frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionEntry {
    pub frame: u64,
    pub agent_id: EntityId,
    pub branch: ActionBranch,
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRole {
    pub agent_id: EntityId,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeRecord {
    pub episode: u32,
    pub win_condition: WinCondition,
    /// Seconds of simulated time
    pub duration: f32,
    pub agents: Vec<AgentRole>,
    pub actions: Vec<ActionEntry>,
}

/// Which encodings to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Json,
    Binary,
    Both,
}

impl FromStr for RecordFormat {
    type Err = ReplayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(RecordFormat::Json),
            "binary" | "bin" => Ok(RecordFormat::Binary),
            "both" => Ok(RecordFormat::Both),
            other => Err(ReplayError::UnknownFormat(other.to_string())),
        }
    }
}

// Wire messages for the binary form.

#[derive(Clone, PartialEq, Message)]
pub struct EpisodeRecordMessage {
    #[prost(uint32, tag = "1")]
    pub episode: u32,
    #[prost(string, tag = "2")]
    pub win_condition: String,
    #[prost(float, tag = "3")]
    pub duration: f32,
    #[prost(message, repeated, tag = "4")]
    pub agents: Vec<AgentRoleMessage>,
    #[prost(message, repeated, tag = "5")]
    pub actions: Vec<ActionEntryMessage>,
}

#[derive(Clone, PartialEq, Message)]
pub struct AgentRoleMessage {
    #[prost(string, tag = "1")]
    pub agent_id: String,
    #[prost(string, tag = "2")]
    pub role: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct ActionEntryMessage {
    #[prost(uint64, tag = "1")]
    pub frame: u64,
    #[prost(string, tag = "2")]
    pub agent_id: String,
    #[prost(string, tag = "3")]
    pub branch: String,
    #[prost(sint32, tag = "4")]
    pub value: i32,
}

impl From<&EpisodeRecord> for EpisodeRecordMessage {
    fn from(record: &EpisodeRecord) -> Self {
        Self {
            episode: record.episode,
            win_condition: record.win_condition.as_str().to_string(),
            duration: record.duration,
            agents: record
                .agents
                .iter()
                .map(|a| AgentRoleMessage {
                    agent_id: a.agent_id.to_string(),
                    role: a.role.clone(),
                })
                .collect(),
            actions: record
                .actions
                .iter()
                .map(|a| ActionEntryMessage {
                    frame: a.frame,
                    agent_id: a.agent_id.to_string(),
                    branch: a.branch.as_str().to_string(),
                    value: a.value,
                })
                .collect(),
        }
    }
}

impl TryFrom<EpisodeRecordMessage> for EpisodeRecord {
    type Error = ReplayError;

    fn try_from(message: EpisodeRecordMessage) -> Result<Self, Self::Error> {
        let actions = message
            .actions
            .into_iter()
            .map(|a| {
                let branch = ActionBranch::from_name(&a.branch)
                    .ok_or_else(|| ReplayError::UnknownBranch(a.branch.clone()))?;
                Ok(ActionEntry {
                    frame: a.frame,
                    agent_id: EntityId::new(a.agent_id),
                    branch,
                    value: a.value,
                })
            })
            .collect::<Result<Vec<_>, ReplayError>>()?;

        Ok(Self {
            episode: message.episode,
            win_condition: message.win_condition.parse()?,
            duration: message.duration,
            agents: message
                .agents
                .into_iter()
                .map(|a| AgentRole {
                    agent_id: EntityId::new(a.agent_id),
                    role: a.role,
                })
                .collect(),
            actions,
        })
    }
}

impl EpisodeRecord {
    pub fn file_stem(&self) -> String {
        format!("episode_{}", self.episode)
    }

    pub fn to_json(&self) -> Result<String, ReplayError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        EpisodeRecordMessage::from(self).encode_length_delimited_to_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ReplayError> {
        EpisodeRecordMessage::decode_length_delimited(bytes)?.try_into()
    }

    /// File names and contents for the requested encodings.
    pub fn encode_files(&self, format: RecordFormat) -> Result<Vec<(String, Vec<u8>)>, ReplayError> {
        let stem = self.file_stem();
        let mut files = Vec::new();
        if matches!(format, RecordFormat::Json | RecordFormat::Both) {
            files.push((format!("{stem}.json"), self.to_json()?.into_bytes()));
        }
        if matches!(format, RecordFormat::Binary | RecordFormat::Both) {
            files.push((format!("{stem}.bin"), self.to_bytes()));
        }
        Ok(files)
    }

    /// Write the record into `dir`, returning the paths written.
    pub fn save(&self, dir: &Path, format: RecordFormat) -> Result<Vec<PathBuf>, ReplayError> {
        fs::create_dir_all(dir).map_err(|source| ReplayError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut written = Vec::new();
        for (name, bytes) in self.encode_files(format)? {
            let path = dir.join(name);
            fs::write(&path, bytes).map_err(|source| ReplayError::Io {
                path: path.clone(),
                source,
            })?;
            written.push(path);
        }
        Ok(written)
    }

    /// Read a record, choosing the codec from the file extension.
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let io_error = |source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        };
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&fs::read_to_string(path).map_err(io_error)?),
            Some("bin") => Self::from_bytes(&fs::read(path).map_err(io_error)?),
            other => Err(ReplayError::UnknownFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }
}

/// Load every record in `dir`, sorted by episode number.
pub fn load_records_dir(dir: &Path) -> Result<Vec<EpisodeRecord>, ReplayError> {
    let entries = fs::read_dir(dir).map_err(|source| ReplayError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut records = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        match EpisodeRecord::load(&path) {
            Ok(record) => records.push(record),
            Err(ReplayError::UnknownFormat(_)) => {}
            Err(e) => tracing::warn!("skipping {}: {}", path.display(), e),
        }
    }
    records.sort_by_key(|r| r.episode);
    Ok(records)
}

/// Timestamped directory for one recording session below `root`.
pub fn session_directory(root: &Path) -> PathBuf {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let stamp = format_description::parse("[year][month][day]-[hour][minute][second]")
        .ok()
        .and_then(|format| now.format(&format).ok())
        .unwrap_or_else(|| "session".to_string());
    root.join(stamp)
}
