//! Database schema and migrations for HNTLDR.
//!
//! Migrations are applied in order; the schema_version table records which
//! ones have run. Timestamps are fixed-width UTC text written by
//! `crate::datetime::to_db_timestamp` or the matching `strftime` default.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: Append-only ranking snapshots
    r#"
CREATE TABLE rankings (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    story_id    INTEGER NOT NULL,
    rank        INTEGER NOT NULL,           -- 1-based position at fetch time
    score       INTEGER NOT NULL,
    story_time  TEXT NOT NULL,              -- story creation time
    fetched_at  TEXT NOT NULL,              -- shared by every row of one snapshot
    UNIQUE(story_id, fetched_at)
);

CREATE INDEX idx_rankings_fetched_at ON rankings(fetched_at);
"#,
    // v2: Episodes and their cited sources
    r#"
CREATE TABLE episodes (
    id            TEXT PRIMARY KEY,         -- UUID
    episode_type  TEXT NOT NULL CHECK (episode_type IN ('daily', 'weekly')),
    start_date    TEXT NOT NULL,
    end_date      TEXT NOT NULL,
    title         TEXT NOT NULL,
    summary       TEXT NOT NULL,
    audio_url     TEXT NOT NULL,            -- audio storage key
    created_at    TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    CHECK (start_date <= end_date)
);

CREATE INDEX idx_episodes_end_date ON episodes(end_date);

CREATE TABLE episode_sources (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    episode_id      TEXT NOT NULL REFERENCES episodes(id) ON DELETE CASCADE,
    position        INTEGER NOT NULL,
    story_id        INTEGER,
    url             TEXT NOT NULL,
    title           TEXT NOT NULL,
    points          INTEGER NOT NULL,
    comments_count  INTEGER NOT NULL,
    created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE INDEX idx_episode_sources_episode_id ON episode_sources(episode_id);
"#,
    // v3: Newsletter subscribers (soft-deleted via status)
    r#"
CREATE TABLE subscribers (
    id          TEXT PRIMARY KEY,           -- UUID, used in unsubscribe links
    email       TEXT NOT NULL UNIQUE,
    status      TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'inactive')),
    created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE INDEX idx_subscribers_status ON subscribers(status);
"#,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_not_empty() {
        assert!(!MIGRATIONS.is_empty());
    }

    #[test]
    fn test_rankings_migration_has_snapshot_key() {
        let rankings = MIGRATIONS[0];
        assert!(rankings.contains("CREATE TABLE rankings"));
        assert!(rankings.contains("UNIQUE(story_id, fetched_at)"));
    }

    #[test]
    fn test_episodes_migration_contains_sources() {
        let episodes = MIGRATIONS[1];
        assert!(episodes.contains("CREATE TABLE episodes"));
        assert!(episodes.contains("CREATE TABLE episode_sources"));
        assert!(episodes.contains("ON DELETE CASCADE"));
    }

    #[test]
    fn test_subscribers_migration_has_unique_email() {
        let subscribers = MIGRATIONS[2];
        assert!(subscribers.contains("CREATE TABLE subscribers"));
        assert!(subscribers.contains("email       TEXT NOT NULL UNIQUE"));
    }
}
