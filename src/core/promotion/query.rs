use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A named promotion tier in the Forge promotion index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Latest,
    Recommended,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Latest => "latest",
            Channel::Recommended => "recommended",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a server asks for: a concrete loader build or a promotion channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LoaderQuery {
    Explicit(String),
    Channel(Channel),
}

impl LoaderQuery {
    /// Exactly `latest` or `recommended` (case-sensitive) is a channel;
    /// any other text is an explicit build id.
    pub fn parse(text: &str) -> Self {
        match text {
            "latest" => LoaderQuery::Channel(Channel::Latest),
            "recommended" => LoaderQuery::Channel(Channel::Recommended),
            other => LoaderQuery::Explicit(other.to_string()),
        }
    }

    pub fn is_channel(&self) -> bool {
        matches!(self, LoaderQuery::Channel(_))
    }
}

impl fmt::Display for LoaderQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderQuery::Explicit(build) => f.write_str(build),
            LoaderQuery::Channel(channel) => f.write_str(channel.as_str()),
        }
    }
}

impl FromStr for LoaderQuery {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Serialize for LoaderQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LoaderQuery {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::parse(&String::deserialize(deserializer)?))
    }
}
