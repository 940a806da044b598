//! Engine families and their initialization option lists.
//!
//! Every family runs through the same [`EngineProcess`](super::EngineProcess);
//! what differs is the list of commands sent between `uci` and `isready`.

use super::personality::PersonalityFileLoader;
use crate::config::EngineConfig;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// The kinds of engine the server knows how to configure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineFamily {
    /// Any UCI engine, configured with the common options only
    Generic,
    Stockfish,
    /// Leela Chess Zero
    Leela,
    /// Maia networks running on lc0
    Maia,
    /// Rodent IV with personality files
    Rodent,
}

impl EngineFamily {
    pub const ALL: [EngineFamily; 5] = [
        EngineFamily::Generic,
        EngineFamily::Stockfish,
        EngineFamily::Leela,
        EngineFamily::Maia,
        EngineFamily::Rodent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineFamily::Generic => "generic",
            EngineFamily::Stockfish => "stockfish",
            EngineFamily::Leela => "leela",
            EngineFamily::Maia => "maia",
            EngineFamily::Rodent => "rodent",
        }
    }

    /// Commands sent after `uci` and before `isready`.
    ///
    /// The user's raw initialization commands always come last so they can
    /// override anything the family sets. Rodent personality files are read
    /// here.
    pub async fn init_commands(&self, config: &EngineConfig) -> Vec<String> {
        let mut commands = match self {
            EngineFamily::Generic => {
                return generic_init_commands(
                    config.multipv,
                    config.threads,
                    config.hash_mb,
                    &config.init_commands,
                )
            }
            EngineFamily::Stockfish => stockfish_options(config),
            EngineFamily::Leela => leela_options(config),
            EngineFamily::Maia => maia_options(config),
            EngineFamily::Rodent => rodent_options(config).await,
        };

        commands.extend(raw_commands(&config.init_commands));
        commands
    }
}

impl fmt::Display for EngineFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineFamily {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generic" | "uci" => Ok(EngineFamily::Generic),
            "stockfish" => Ok(EngineFamily::Stockfish),
            "leela" | "lc0" => Ok(EngineFamily::Leela),
            "maia" => Ok(EngineFamily::Maia),
            "rodent" => Ok(EngineFamily::Rodent),
            other => Err(EngineError::UnknownFamily(other.to_string())),
        }
    }
}

fn set_option(name: &str, value: impl fmt::Display) -> String {
    format!("setoption name {} value {}", name, value)
}

fn raw_commands(commands: &[String]) -> impl Iterator<Item = String> + '_ {
    commands
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

/// Option list for an engine started directly from a path.
///
/// Values at the engine's usual defaults are left out: MultiPV and Threads
/// only above 1, Hash only when set.
pub fn generic_init_commands(multipv: u32, threads: u32, hash_mb: u32, extra: &[String]) -> Vec<String> {
    let mut commands = Vec::new();
    if multipv > 1 {
        commands.push(set_option("MultiPV", multipv));
    }
    if threads > 1 {
        commands.push(set_option("Threads", threads));
    }
    if hash_mb > 0 {
        commands.push(set_option("Hash", hash_mb));
    }
    commands.extend(raw_commands(extra));
    commands
}

fn stockfish_options(config: &EngineConfig) -> Vec<String> {
    let mut commands = Vec::new();
    if config.threads > 0 {
        commands.push(set_option("Threads", config.threads));
    }
    if config.hash_mb > 0 {
        commands.push(set_option("Hash", config.hash_mb));
    }
    if config.multipv > 0 {
        commands.push(set_option("MultiPV", config.multipv));
    }
    if let Some(dir) = &config.tablebase_dir {
        commands.push(set_option("SyzygyPath", dir.join("syzygy").display()));
    }
    commands
}

fn leela_options(config: &EngineConfig) -> Vec<String> {
    let mut commands = Vec::new();
    let weights = config
        .weights_file
        .clone()
        .unwrap_or_else(|| config.weights_dir.join("network.pb.gz"));
    commands.push(set_option("WeightsFile", weights.display()));
    if config.threads > 0 {
        commands.push(set_option("Threads", config.threads));
    }
    commands.push(set_option("Backend", &config.backend));
    if config.multipv > 0 {
        commands.push(set_option("MultiPV", config.multipv));
    }
    commands
}

fn maia_options(config: &EngineConfig) -> Vec<String> {
    let weights = config
        .weights_file
        .clone()
        .unwrap_or_else(|| config.weights_dir.join(format!("maia-{}.pb.gz", config.maia_rating)));

    // Maia plays from the raw policy: one node per move, no search.
    vec![
        set_option("WeightsFile", weights.display()),
        set_option("Threads", 1),
        set_option("MinibatchSize", 1),
        set_option("MaxPrefetch", 0),
        set_option("NodesPerSecondLimit", 0.001),
        set_option("SlowMover", 0),
        set_option("Backend", &config.backend),
        set_option("MultiPV", config.multipv.max(1)),
    ]
}

async fn rodent_options(config: &EngineConfig) -> Vec<String> {
    let mut commands = Vec::new();
    if config.threads > 0 {
        commands.push(set_option("Threads", config.threads));
    }
    if config.hash_mb > 0 {
        commands.push(set_option("Hash", config.hash_mb));
    }
    if config.multipv > 0 {
        commands.push(set_option("MultiPV", config.multipv));
    }

    if let Some(file) = &config.personality_file {
        match PersonalityFileLoader::load(file, &config.personalities_dir).await {
            Ok(options) => {
                info!("🎭 Loaded Rodent personality {} ({} options)", file.display(), options.len());
                commands.extend(
                    options
                        .iter()
                        .map(|(name, value)| PersonalityFileLoader::to_command(name, value)),
                );
            }
            Err(e) => warn!("Failed to load personality {}: {}", file.display(), e),
        }
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_family_names() {
        assert_eq!("Stockfish".parse::<EngineFamily>().unwrap(), EngineFamily::Stockfish);
        assert_eq!("lc0".parse::<EngineFamily>().unwrap(), EngineFamily::Leela);
        assert!(matches!(
            "komodo".parse::<EngineFamily>(),
            Err(EngineError::UnknownFamily(name)) if name == "komodo"
        ));
        for family in EngineFamily::ALL {
            assert_eq!(family.to_string().parse::<EngineFamily>().unwrap(), family);
        }
    }

    #[test]
    fn test_generic_options_skip_defaults() {
        assert!(generic_init_commands(1, 1, 0, &[]).is_empty());

        let commands = generic_init_commands(5, 4, 256, &["setoption name Contempt value 0".to_string()]);
        assert_eq!(
            commands,
            vec![
                "setoption name MultiPV value 5",
                "setoption name Threads value 4",
                "setoption name Hash value 256",
                "setoption name Contempt value 0",
            ]
        );
    }

    #[tokio::test]
    async fn test_stockfish_options_with_tablebases() {
        let config = EngineConfig {
            threads: 2,
            hash_mb: 64,
            multipv: 3,
            tablebase_dir: Some(PathBuf::from("/tb")),
            init_commands: vec!["setoption name Ponder value false".to_string(), "  ".to_string()],
            ..Default::default()
        };

        assert_eq!(
            EngineFamily::Stockfish.init_commands(&config).await,
            vec![
                "setoption name Threads value 2",
                "setoption name Hash value 64",
                "setoption name MultiPV value 3",
                "setoption name SyzygyPath value /tb/syzygy",
                "setoption name Ponder value false",
            ]
        );
    }

    #[tokio::test]
    async fn test_leela_default_weights() {
        let config = EngineConfig {
            threads: 2,
            multipv: 0,
            ..Default::default()
        };
        assert_eq!(
            EngineFamily::Leela.init_commands(&config).await,
            vec![
                "setoption name WeightsFile value weights/network.pb.gz",
                "setoption name Threads value 2",
                "setoption name Backend value multiplexing",
            ]
        );
    }

    #[tokio::test]
    async fn test_maia_options() {
        let config = EngineConfig {
            multipv: 0,
            maia_rating: 1900,
            ..Default::default()
        };
        let commands = EngineFamily::Maia.init_commands(&config).await;
        assert_eq!(commands[0], "setoption name WeightsFile value weights/maia-1900.pb.gz");
        assert_eq!(commands[1], "setoption name Threads value 1");
        assert_eq!(commands[4], "setoption name NodesPerSecondLimit value 0.001");
        assert_eq!(commands.last().unwrap(), "setoption name MultiPV value 1");
    }

    #[tokio::test]
    async fn test_rodent_personality_is_applied_before_raw_commands() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("karpov.txt"),
            "; quiet positional play\nsetoption name Aggression value 80\n",
        )
        .unwrap();

        let config = EngineConfig {
            threads: 1,
            hash_mb: 0,
            multipv: 1,
            personality_file: Some(PathBuf::from("karpov.txt")),
            personalities_dir: dir.path().to_path_buf(),
            init_commands: vec!["setoption name UCI_LimitStrength value true".to_string()],
            ..Default::default()
        };

        assert_eq!(
            EngineFamily::Rodent.init_commands(&config).await,
            vec![
                "setoption name Threads value 1",
                "setoption name MultiPV value 1",
                "setoption name Aggression value 80",
                "setoption name UCI_LimitStrength value true",
            ]
        );
    }

    #[tokio::test]
    async fn test_rodent_missing_personality_is_skipped() {
        let config = EngineConfig {
            threads: 0,
            hash_mb: 0,
            multipv: 0,
            personality_file: Some(PathBuf::from("/nonexistent/personality.txt")),
            ..Default::default()
        };
        assert!(EngineFamily::Rodent.init_commands(&config).await.is_empty());
    }
}
