//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! Every command opens the configured ledger itself. Writes are durable when
//! the ledger call returns, whichever backend is configured.

use crate::api;
use crate::chat::{Bot, InboundMessage, reply};
use crate::config::{Backend, KarmaConfig};
use crate::storage::open_ledger;
use karma_core::{
    Direction, KarmaError, Ledger, UserId,
    formats::snapshot_hash,
    ledger_to_bytes, load_snapshot,
    primitives::MAX_LEADERBOARD_LIMIT,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum file size for a replayed chat log (100 MB).
///
/// This prevents memory exhaustion from malicious or accidental large files.
const MAX_REPLAY_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), KarmaError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| KarmaError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(KarmaError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Validate an input path.
///
/// Canonicalizes the path (resolving symlinks and "..") and ensures it
/// names an existing regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, KarmaError> {
    let canonical = path.canonicalize().map_err(|e| {
        KarmaError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(KarmaError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Validate an output path: the parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, KarmaError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        KarmaError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(KarmaError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| KarmaError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
///
/// `host` and `port` from the command line win over the config file and
/// the environment.
pub async fn cmd_server(
    config: &KarmaConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), KarmaError> {
    let mut server = config.server.clone().with_env()?;
    if let Some(host) = host {
        server.host = host;
    }
    if let Some(port) = port {
        server.port = port;
    }
    let bot = Bot::open(config)?;

    println!("Karma Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:       {}", server.host);
    println!("  Port:       {}", server.port);
    println!("  Backend:    {}", config.storage.backend);
    println!("  Database:   {:?}", config.storage.database);
    println!(
        "  Auth:       {}",
        if server.api_key.is_some() { "api key" } else { "off" }
    );
    match server.rate_limit {
        0 => println!("  Rate limit: off"),
        rps => println!("  Rate limit: {} req/s", rps),
    }
    println!();
    println!("Endpoints:");
    println!("  POST /message             - Feed a chat line through the bot");
    println!("  GET  /karma/top           - Highest receivers");
    println!("  GET  /karma/bottom        - Lowest receivers");
    println!("  GET  /karma/giver         - Most positive karma given");
    println!("  GET  /karma/taker         - Most negative karma given");
    println!("  GET  /karma/users/{{user}}  - One user's total");
    println!("  GET  /transfers           - Recent transfers");
    println!("  GET  /status              - Ledger counts");
    println!("  POST /export              - Export ledger snapshot");
    println!("  GET  /health              - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(bot, &server).await
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new, empty ledger.
pub fn cmd_init(config: &KarmaConfig, force: bool) -> Result<(), KarmaError> {
    let db_path = &config.storage.database;
    if db_path.exists() {
        if !force {
            return Err(KarmaError::IoError(
                "Ledger already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(db_path)
            .map_err(|e| KarmaError::IoError(format!("Remove existing ledger: {}", e)))?;
    }

    match config.storage.backend {
        Backend::Redb => {
            let _ledger = Ledger::with_redb(db_path)?;
            println!("Initialized new redb ledger at {:?}", db_path);
        }
        Backend::File => {
            let _ledger = Ledger::with_snapshot(db_path)?;
            println!("Initialized new file ledger at {:?}", db_path);
        }
    }

    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show ledger counts.
pub fn cmd_status(config: &KarmaConfig, json_mode: bool) -> Result<(), KarmaError> {
    let ledger = open_ledger(&config.storage)?;
    let stats = ledger.stats()?;

    if json_mode {
        print_json(&serde_json::json!({
            "database": config.storage.database.to_string_lossy(),
            "backend": config.storage.backend,
            "transfer_count": stats.transfer_count,
            "receiver_count": stats.receiver_count,
            "giver_count": stats.giver_count,
        }));
        return Ok(());
    }

    println!("Karma Ledger Status");
    println!("===================");
    println!("Database: {:?}", config.storage.database);
    println!("Backend:  {}", config.storage.backend);
    println!();
    println!("Transfers: {}", stats.transfer_count);
    println!("Receivers: {}", stats.receiver_count);
    println!("Givers:    {}", stats.giver_count);

    Ok(())
}

// =============================================================================
// SAY / REPLAY COMMANDS
// =============================================================================

/// Feed one chat line through the bot and print its replies.
pub fn cmd_say(
    config: &KarmaConfig,
    json_mode: bool,
    from: &str,
    text: &str,
    directed: bool,
    private: bool,
) -> Result<(), KarmaError> {
    UserId::parse(from)?;

    let mut bot = Bot::open(config)?;
    let before = bot.ledger().transfer_count()?;

    let message = InboundMessage {
        user: from.to_string(),
        text: text.to_string(),
        directed,
        private,
    };
    let replies = bot.handle(&message);
    let recorded = bot.ledger().transfer_count()?.saturating_sub(before);

    if json_mode {
        print_json(&serde_json::json!({
            "replies": replies,
            "recorded": recorded,
        }));
        return Ok(());
    }

    for line in &replies {
        println!("{}", line);
    }
    if recorded > 0 {
        println!("({} transfer(s) recorded)", recorded);
    }
    Ok(())
}

/// Split a log line of the form `user: text`.
///
/// Returns `None` for blank lines and lines without an author.
fn parse_log_line(line: &str) -> Option<(&str, &str)> {
    let (user, text) = line.split_once(':')?;
    let user = user.trim();
    if user.is_empty() {
        return None;
    }
    Some((user, text))
}

/// Feed a chat log through the bot, one `user: text` line at a time.
pub fn cmd_replay(config: &KarmaConfig, json_mode: bool, file: &Path) -> Result<(), KarmaError> {
    tracing::info!("Replaying chat log {:?}", file);

    let validated_path = validate_file_path(file)?;
    validate_file_size(&validated_path, MAX_REPLAY_FILE_SIZE)?;

    let contents = std::fs::read(&validated_path)
        .map_err(|e| KarmaError::IoError(format!("Read file: {}", e)))?;
    let log = String::from_utf8_lossy(&contents);

    let mut bot = Bot::open(config)?;
    let before = bot.ledger().transfer_count()?;

    let mut processed = 0usize;
    let mut skipped = 0usize;
    let mut replies = Vec::new();

    for (number, line) in log.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let Some((user, text)) = parse_log_line(line) else {
            tracing::debug!(line = number + 1, "Skipping line without author");
            skipped += 1;
            continue;
        };
        processed += 1;
        replies.extend(bot.handle(&InboundMessage::public(user, text)));
    }

    let recorded = bot.ledger().transfer_count()?.saturating_sub(before);

    if json_mode {
        print_json(&serde_json::json!({
            "processed": processed,
            "skipped": skipped,
            "recorded": recorded,
            "replies": replies,
        }));
        return Ok(());
    }

    for line in &replies {
        println!("{}", line);
    }
    println!(
        "Replayed {} lines ({} skipped), {} transfers recorded",
        processed, skipped, recorded
    );
    Ok(())
}

// =============================================================================
// QUERY COMMANDS
// =============================================================================

/// Print the top or bottom of the leaderboard.
pub fn cmd_leaderboard(
    config: &KarmaConfig,
    json_mode: bool,
    direction: Direction,
    limit: Option<usize>,
) -> Result<(), KarmaError> {
    let limit = limit.unwrap_or(config.chat.leaderboard_limit);
    if limit > MAX_LEADERBOARD_LIMIT {
        return Err(KarmaError::InvalidQuery(format!(
            "limit {} exceeds maximum {}",
            limit, MAX_LEADERBOARD_LIMIT
        )));
    }

    let ledger = open_ledger(&config.storage)?;
    let board = ledger.leaderboard(direction, limit)?;

    if json_mode {
        print_json(&serde_json::json!({
            "direction": direction,
            "entries": board,
        }));
        return Ok(());
    }

    for line in reply::leaderboard(&board) {
        println!("{}", line);
    }
    Ok(())
}

/// Print the most prolific giver of positive karma.
pub fn cmd_giver(config: &KarmaConfig, json_mode: bool) -> Result<(), KarmaError> {
    let giver = open_ledger(&config.storage)?.top_giver()?;

    if json_mode {
        print_json(&serde_json::json!({ "giver": giver }));
    } else {
        println!("{}", reply::top_giver(giver.as_ref()));
    }
    Ok(())
}

/// Print the most prolific giver of negative karma.
pub fn cmd_taker(config: &KarmaConfig, json_mode: bool) -> Result<(), KarmaError> {
    let taker = open_ledger(&config.storage)?.top_taker()?;

    if json_mode {
        print_json(&serde_json::json!({ "taker": taker }));
    } else {
        println!("{}", reply::top_taker(taker.as_ref()));
    }
    Ok(())
}

/// Print one user's total.
pub fn cmd_user(config: &KarmaConfig, json_mode: bool, name: &str) -> Result<(), KarmaError> {
    let user = UserId::parse(name)?;
    let ledger = open_ledger(&config.storage)?;
    let found = ledger.has_received(&user)?;
    let points = ledger.total_for(&user)?;

    if json_mode {
        print_json(&serde_json::json!({
            "user": user,
            "found": found,
            "points": points,
        }));
    } else {
        println!("{}", reply::user_total(&user, found.then_some(points)));
    }
    Ok(())
}

/// Print the most recent transfers, oldest first.
pub fn cmd_history(config: &KarmaConfig, json_mode: bool, limit: usize) -> Result<(), KarmaError> {
    let mut transfers = open_ledger(&config.storage)?.all_transfers()?;
    let total = transfers.len();
    let recent = transfers.split_off(total.saturating_sub(limit));

    if json_mode {
        print_json(&serde_json::json!({
            "total": total,
            "transfers": recent,
        }));
        return Ok(());
    }

    if recent.is_empty() {
        println!("No transfers recorded yet");
        return Ok(());
    }
    for transfer in &recent {
        println!(
            "{}  {} -> {}  {:+}",
            transfer.timestamp().format("%Y-%m-%d %H:%M:%S"),
            transfer.giver(),
            transfer.receiver(),
            transfer.delta()
        );
    }
    if total > recent.len() {
        println!("... {} earlier transfers not shown", total - recent.len());
    }
    Ok(())
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Export the whole ledger.
///
/// `canonical` writes the binary snapshot that `import` and the file backend
/// read; `json` writes the transfers for people and other tools.
pub fn cmd_export(config: &KarmaConfig, output: &Path, format: &str) -> Result<(), KarmaError> {
    let validated_output = validate_output_path(output)?;

    let transfers = open_ledger(&config.storage)?.all_transfers()?;

    let data = match format {
        "canonical" => {
            let data = ledger_to_bytes(&transfers)?;
            println!("Checksum: {}", snapshot_hash(&data));
            data
        }
        "json" => serde_json::to_vec_pretty(&transfers)
            .map_err(|e| KarmaError::SerializationError(e.to_string()))?,
        _ => {
            return Err(KarmaError::InvalidQuery(format!(
                "Unknown format: {}. Use: canonical, json",
                format
            )));
        }
    };

    std::fs::write(&validated_output, &data)
        .map_err(|e| KarmaError::IoError(format!("Write file: {}", e)))?;

    println!(
        "Exported {} transfers ({} bytes) to {:?}",
        transfers.len(),
        data.len(),
        validated_output
    );

    Ok(())
}

// =============================================================================
// IMPORT COMMAND
// =============================================================================

/// Import a canonical snapshot.
///
/// Refuses to touch a ledger that already has history unless `append` is
/// set, since importing the same snapshot twice would double every total.
pub fn cmd_import(config: &KarmaConfig, input: &Path, append: bool) -> Result<(), KarmaError> {
    let validated_path = validate_file_path(input)?;
    let transfers = load_snapshot(&validated_path)?;

    let mut ledger = open_ledger(&config.storage)?;
    let existing = ledger.transfer_count()?;
    if existing > 0 && !append {
        return Err(KarmaError::InvalidQuery(format!(
            "Ledger already holds {} transfers. Use --append to add to it.",
            existing
        )));
    }

    let imported = ledger.import(&transfers)?;

    println!(
        "Imported {} transfers ({} total)",
        imported,
        ledger.transfer_count()?
    );

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;

    fn config_in(dir: &Path, backend: Backend) -> KarmaConfig {
        KarmaConfig {
            storage: StorageConfig {
                database: dir.join("karma.db"),
                backend,
            },
            ..KarmaConfig::default()
        }
    }

    #[test]
    fn log_lines_split_on_first_colon() {
        assert_eq!(parse_log_line("dave: alice++"), Some(("dave", " alice++")));
        assert_eq!(
            parse_log_line("dave: time is 10:30, thanks bob++"),
            Some(("dave", " time is 10:30, thanks bob++"))
        );
        assert_eq!(parse_log_line("no author here"), None);
        assert_eq!(parse_log_line("  : orphan text"), None);
    }

    #[test]
    fn say_then_query_with_file_backend() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_in(dir.path(), Backend::File);

        cmd_say(&config, false, "dave", "alice++ bob--", false, false).expect("say");
        cmd_say(&config, true, "erin", "alice++", false, false).expect("say");

        let ledger = open_ledger(&config.storage).expect("open");
        assert_eq!(
            ledger
                .total_for(&UserId::parse("alice").expect("id"))
                .expect("total"),
            2
        );
        assert!(cmd_leaderboard(&config, false, Direction::Top, None).is_ok());
        assert!(cmd_user(&config, true, "Alice").is_ok());
    }

    #[test]
    fn say_rejects_blank_author() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_in(dir.path(), Backend::File);
        assert!(matches!(
            cmd_say(&config, false, "   ", "alice++", false, false),
            Err(KarmaError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn replay_records_every_line() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_in(dir.path(), Backend::Redb);
        let log = dir.path().join("chat.log");
        std::fs::write(
            &log,
            "a: x++\nb: x++\n\nnot a chat line\nc: y--\nc: c++\n",
        )
        .expect("write log");

        cmd_replay(&config, true, &log).expect("replay");

        let ledger = open_ledger(&config.storage).expect("open");
        assert_eq!(ledger.transfer_count().expect("count"), 3);
        let top = ledger.leaderboard(Direction::Top, 5).expect("board");
        assert_eq!(top.last().map(|s| s.points), Some(2));
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_in(dir.path(), Backend::File);

        cmd_init(&config, false).expect("init");
        assert!(cmd_init(&config, false).is_err());
        assert!(cmd_init(&config, true).is_ok());
    }

    #[test]
    fn export_then_import_into_fresh_ledger() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = config_in(dir.path(), Backend::Redb);
        cmd_say(&source, false, "dave", "alice++ (bob smith)--", false, false).expect("say");

        let snapshot = dir.path().join("export.krma");
        cmd_export(&source, &snapshot, "canonical").expect("export");

        let target_dir = tempfile::tempdir().expect("tempdir");
        let target = config_in(target_dir.path(), Backend::File);
        cmd_import(&target, &snapshot, false).expect("import");

        let imported = open_ledger(&target.storage).expect("open");
        assert_eq!(imported.transfer_count().expect("count"), 2);

        // A second import would double the history.
        assert!(cmd_import(&target, &snapshot, false).is_err());
        cmd_import(&target, &snapshot, true).expect("append");
        let doubled = open_ledger(&target.storage).expect("open");
        assert_eq!(doubled.transfer_count().expect("count"), 4);
    }

    #[test]
    fn json_export_is_readable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_in(dir.path(), Backend::File);
        cmd_say(&config, false, "dave", "alice++", false, false).expect("say");

        let out = dir.path().join("export.json");
        cmd_export(&config, &out, "json").expect("export");

        let text = std::fs::read_to_string(&out).expect("read");
        let value: serde_json::Value = serde_json::from_str(&text).expect("json");
        assert_eq!(value[0]["receiver"], "alice");
        assert_eq!(value[0]["delta"], 1);
    }

    #[test]
    fn unknown_export_format_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_in(dir.path(), Backend::File);
        let out = dir.path().join("export.xml");
        assert!(matches!(
            cmd_export(&config, &out, "xml"),
            Err(KarmaError::InvalidQuery(_))
        ));
    }

    #[test]
    fn leaderboard_limit_is_bounded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_in(dir.path(), Backend::File);
        assert!(cmd_leaderboard(&config, false, Direction::Top, Some(10_000)).is_err());
    }
}
