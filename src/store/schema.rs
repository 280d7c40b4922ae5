pub const SCHEMA: &str = r#"
-- Accounts. Usernames and emails are stored lowercase; the password hash is
-- an argon2id PHC string. Rows are never hard-deleted.
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),

    -- Avatar passthrough (bytes stored as-is, served base64)
    profile_picture_name TEXT,
    profile_picture_mime TEXT,
    profile_picture BLOB,

    about TEXT
);

-- Server-side sessions, one row per live login. Sign-in inserts, sign-out
-- deletes the presented token. expires_at NULL = never.
CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now')),
    expires_at TEXT
);

-- Posts carry author and topic snapshots taken at creation time.
-- likes is denormalized; it must equal the count of likes rows and is only
-- ever mutated in the same transaction as the likes row.
CREATE TABLE IF NOT EXISTS posts (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    markdown TEXT NOT NULL,
    html TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    last_edit TEXT,
    likes INTEGER NOT NULL DEFAULT 0,
    author_id TEXT NOT NULL REFERENCES users(id),
    author_username TEXT NOT NULL,
    topic_id TEXT NOT NULL REFERENCES topics(id),
    topic_name TEXT NOT NULL,
    removed INTEGER NOT NULL DEFAULT 0
);

-- Topic names are normalized to lowercase and unique; lookup-or-create
-- relies on the constraint rather than read-then-write.
CREATE TABLE IF NOT EXISTS topics (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS likes (
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    post_id TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
    PRIMARY KEY (user_id, post_id)
);

CREATE TABLE IF NOT EXISTS followers (
    follower_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    followed_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    PRIMARY KEY (follower_id, followed_id)
);

CREATE TABLE IF NOT EXISTS bookmarks (
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    post_id TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (user_id, post_id)
);

-- Create indexes
CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
CREATE INDEX IF NOT EXISTS idx_posts_created ON posts(created_at DESC, id DESC);
CREATE INDEX IF NOT EXISTS idx_posts_topic_name ON posts(topic_name);
CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id);
CREATE INDEX IF NOT EXISTS idx_likes_post ON likes(post_id);
CREATE INDEX IF NOT EXISTS idx_followers_followed ON followers(followed_id);
CREATE INDEX IF NOT EXISTS idx_bookmarks_post ON bookmarks(post_id);
"#;
