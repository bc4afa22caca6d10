use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Spotify,
    LastFm,
    Local,
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderId::Spotify => write!(f, "spotify"),
            ProviderId::LastFm => write!(f, "lastfm"),
            ProviderId::Local => write!(f, "local"),
        }
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "spotify" => Ok(ProviderId::Spotify),
            "lastfm" | "last.fm" => Ok(ProviderId::LastFm),
            "local" => Ok(ProviderId::Local),
            _ => Err(format!(
                "Invalid provider: '{}'. Valid: spotify, lastfm, local",
                s
            )),
        }
    }
}

impl ProviderId {
    pub fn is_remote(&self) -> bool {
        matches!(self, ProviderId::Spotify | ProviderId::LastFm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_names() {
        for id in [ProviderId::Spotify, ProviderId::LastFm, ProviderId::Local] {
            assert_eq!(id.to_string().parse::<ProviderId>(), Ok(id));
        }
        assert_eq!("Last.fm".parse::<ProviderId>(), Ok(ProviderId::LastFm));
        assert!("tidal".parse::<ProviderId>().is_err());
    }

    #[test]
    fn test_remote_flag() {
        assert!(ProviderId::Spotify.is_remote());
        assert!(!ProviderId::Local.is_remote());
    }
}
