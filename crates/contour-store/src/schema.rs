//! Schema constants. The contour map and section map are stored as JSON
//! blobs on the session row; the transcript is relational.

pub const SCHEMA_VERSION: u32 = 1;

pub const PRAGMAS: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous = NORMAL;
    PRAGMA foreign_keys = ON;
    PRAGMA busy_timeout = 5000;
";

pub const CREATE_TABLES: &str = "
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS sessions (
        id TEXT PRIMARY KEY,
        customer_id TEXT NOT NULL,
        customer_name TEXT NOT NULL,
        stakeholder_name TEXT NOT NULL,
        stakeholder_role TEXT NOT NULL,
        status TEXT NOT NULL,
        current_section TEXT NOT NULL,
        section_status TEXT NOT NULL,
        contour_map TEXT NOT NULL,
        intel_brief TEXT,
        premeet_artifacts TEXT NOT NULL DEFAULT '[]',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS messages (
        id TEXT PRIMARY KEY,
        session_id TEXT NOT NULL REFERENCES sessions(id),
        role TEXT NOT NULL,
        content TEXT NOT NULL,
        rich_content TEXT,
        section TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_sessions_customer ON sessions(customer_id);
    CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id, id);
";
