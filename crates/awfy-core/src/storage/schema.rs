pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS awfy_machine (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  description TEXT NOT NULL,
  confidence_runs INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS awfy_mode (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS awfy_suite (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS awfy_suite_version (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  suite_id INTEGER NOT NULL REFERENCES awfy_suite(id),
  name TEXT NOT NULL,
  confidence_factor REAL NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS awfy_suite_test (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  suite_version_id INTEGER NOT NULL REFERENCES awfy_suite_version(id),
  name TEXT NOT NULL,
  confidence_factor REAL NOT NULL DEFAULT 1,
  noise REAL NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS awfy_run (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  machine INTEGER NOT NULL REFERENCES awfy_machine(id),
  stamp INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS awfy_build (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  run_id INTEGER NOT NULL REFERENCES awfy_run(id),
  mode_id INTEGER NOT NULL REFERENCES awfy_mode(id)
);

CREATE TABLE IF NOT EXISTS awfy_score (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  build_id INTEGER NOT NULL REFERENCES awfy_build(id),
  suite_version_id INTEGER NOT NULL REFERENCES awfy_suite_version(id),
  score REAL NOT NULL,
  status INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS awfy_breakdown (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  build_id INTEGER NOT NULL REFERENCES awfy_build(id),
  suite_test_id INTEGER NOT NULL REFERENCES awfy_suite_test(id),
  score REAL NOT NULL,
  status INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_run_machine_stamp ON awfy_run(machine, stamp);
CREATE INDEX IF NOT EXISTS idx_build_run ON awfy_build(run_id);
CREATE INDEX IF NOT EXISTS idx_score_build ON awfy_score(build_id);
CREATE INDEX IF NOT EXISTS idx_breakdown_build ON awfy_breakdown(build_id);
"#;
