pub const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS students (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        nis TEXT UNIQUE NOT NULL,
        class TEXT NOT NULL,
        grade TEXT NOT NULL,
        photo_url TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS artworks (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT,
        photo_url TEXT NOT NULL,
        qr_code_url TEXT,
        year_created INTEGER NOT NULL,
        subject TEXT NOT NULL DEFAULT 'Art & Craft',
        student_id INTEGER NOT NULL,
        like_count INTEGER DEFAULT 0,
        save_count INTEGER DEFAULT 0,
        view_count INTEGER DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        FOREIGN KEY(student_id) REFERENCES students(id)
    );

    CREATE INDEX IF NOT EXISTS idx_artworks_student_id ON artworks(student_id);

    CREATE TABLE IF NOT EXISTS likes (
        id INTEGER PRIMARY KEY,
        artwork_id INTEGER NOT NULL,
        session_id TEXT NOT NULL,
        created_at TEXT NOT NULL,
        FOREIGN KEY(artwork_id) REFERENCES artworks(id),
        UNIQUE(artwork_id, session_id)
    );

    CREATE TABLE IF NOT EXISTS saves (
        id INTEGER PRIMARY KEY,
        artwork_id INTEGER NOT NULL,
        session_id TEXT NOT NULL,
        created_at TEXT NOT NULL,
        FOREIGN KEY(artwork_id) REFERENCES artworks(id),
        UNIQUE(artwork_id, session_id)
    );

    CREATE TABLE IF NOT EXISTS views (
        id INTEGER PRIMARY KEY,
        artwork_id INTEGER NOT NULL,
        session_id TEXT NOT NULL,
        created_at TEXT NOT NULL,
        FOREIGN KEY(artwork_id) REFERENCES artworks(id),
        UNIQUE(artwork_id, session_id)
    );
";
