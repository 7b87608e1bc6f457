//! Scaffold a starter site.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use kiln_build::BuildConfig;

/// Run the init command.
pub async fn run(config: &BuildConfig, config_path: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing kiln...");

    if config.source_dir.exists() && !yes {
        tracing::warn!(
            "{} already exists. Use --yes to overwrite.",
            config.source_dir.display()
        );
        return Ok(());
    }

    if !config_path.exists() || yes {
        fs::write(config_path, DEFAULT_CONFIG)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        tracing::info!("Created {}", config_path.display());
    }

    for path in scaffold(config, yes)? {
        tracing::info!("Created {}", path.display());
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'kiln' to build and watch the site.");

    Ok(())
}

/// Write the starter source tree. Existing files are kept unless `overwrite`.
///
/// Returns the files written.
pub fn scaffold(config: &BuildConfig, overwrite: bool) -> Result<Vec<PathBuf>> {
    let files = [
        (config.data_file.clone(), DEFAULT_DATA),
        (PathBuf::from("layouts/base.html"), DEFAULT_LAYOUT),
        (config.index_file.clone(), DEFAULT_INDEX),
        (config.pages_dir.join("about.html"), DEFAULT_ABOUT),
        (config.styles_dir.join("main.scss"), DEFAULT_MAIN_SCSS),
        (config.styles_dir.join("_variables.scss"), DEFAULT_VARIABLES_SCSS),
        (config.scripts_dir.join("hamburger.js"), HAMBURGER_JS),
    ];

    let mut written = Vec::new();
    for (relative, content) in files {
        let path = config.source_dir.join(relative);
        if path.exists() && !overwrite {
            continue;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }

    Ok(written)
}

const DEFAULT_CONFIG: &str = r#"# kiln configuration

[paths]
# Source tree
source = "src"

# Output root (sources are mirrored into it)
output = "."

[templates]
# Fail on undefined template variables
strict = true

[styles]
# Browserslist queries used for vendor prefixes
targets = ["defaults"]
prefix = true
minify = true

[scripts]
mangle = true

[images]
# AVIF quality (1-100) and encoder speed (1-10)
quality = 50
speed = 6

[lint]
# Rule identifiers to skip, e.g. ["indent-style"]
disabled = []
"#;

const DEFAULT_DATA: &str = r#"{
  "site": {
    "title": "My Site",
    "description": "Rendered from templates and a JSON content file."
  },
  "nav": [
    { "title": "Home", "url": "/" },
    { "title": "About", "url": "/pages/about.html" }
  ],
  "faq": [
    {
      "question": "Where does this text come from?",
      "answer": "From data.json, merged into the templates at build time."
    },
    {
      "question": "How do I change it?",
      "answer": "Edit any file under src/ while kiln is watching."
    }
  ]
}
"#;

const DEFAULT_LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{% block title %}{{ site.title }}{% endblock %}</title>
    <link rel="stylesheet" href="/styles/main.css">
    <script src="/scripts/hamburger.js" defer></script>
  </head>
  <body>
    <header class="header">
      <a class="header__logo" href="/">{{ site.title }}</a>
      <button class="hamburger-btn hamburger-zone" type="button" aria-label="Menu">
        <span class="hamburger-btn__bar"></span>
      </button>
      <nav class="nav hamburger-zone">
        <ul class="nav__list">
          {% for item in nav %}
          <li class="nav__item"><a href="{{ item.url }}">{{ item.title }}</a></li>
          {% endfor %}
        </ul>
      </nav>
    </header>
    <main class="main">
      {% block content %}{% endblock %}
    </main>
  </body>
</html>
"#;

const DEFAULT_INDEX: &str = r#"{% extends "layouts/base.html" %}

{% block content %}
<section class="hero">
  <h1 class="hero__title">{{ site.title }}</h1>
  <p class="hero__text">{{ site.description }}</p>
</section>
<section class="faq">
  {% for item in faq %}
  <div class="faq__item">
    <button class="faq__question" type="button">{{ item.question }}</button>
    <div class="faq__answer">
      <p>{{ item.answer }}</p>
    </div>
  </div>
  {% endfor %}
</section>
{% endblock %}
"#;

const DEFAULT_ABOUT: &str = r#"{% extends "layouts/base.html" %}

{% block title %}About | {{ site.title }}{% endblock %}

{% block content %}
<section class="page">
  <h1>About</h1>
  <p>Every template under <code>pages/</code> is rendered to the same path in the output.</p>
</section>
{% endblock %}
"#;

const DEFAULT_VARIABLES_SCSS: &str = r#"$color-text: #1d1d1f;
$color-accent: #d9480f;
$gap: 1rem;
$breakpoint: 768px;
"#;

const DEFAULT_MAIN_SCSS: &str = r#"@use "variables" as *;

*,
*::before,
*::after {
  box-sizing: border-box;
}

body {
  margin: 0;
  font-family: system-ui, sans-serif;
  color: $color-text;
}

a {
  color: $color-accent;
}

.header {
  display: flex;
  align-items: center;
  justify-content: space-between;
  padding: $gap;
}

.hamburger-btn {
  user-select: none;
  background: none;
  border: 0;
  cursor: pointer;

  @media (min-width: $breakpoint) {
    display: none;
  }
}

.nav {
  display: none;

  &.active {
    display: block;
  }

  @media (min-width: $breakpoint) {
    display: block;
  }
}

.faq__question {
  width: 100%;
  text-align: left;
}

.faq__answer {
  display: none;
}

.faq__item.active .faq__answer {
  display: block;
}
"#;

const HAMBURGER_JS: &str = r#"document.addEventListener("DOMContentLoaded", () => {
  const zones = document.querySelectorAll(".hamburger-zone");

  // Every button toggles every zone.
  document.querySelectorAll(".hamburger-btn").forEach((btn) => {
    btn.addEventListener("click", (event) => {
      event.preventDefault();
      zones.forEach((zone) => zone.classList.toggle("active"));
    });
  });

  const items = document.querySelectorAll(".faq__item");

  items.forEach((item) => {
    const question = item.querySelector(".faq__question");
    if (!question) {
      return;
    }

    question.addEventListener("click", () => {
      items.forEach((other) => {
        if (other !== item) {
          other.classList.remove("active");
        }
      });
      item.classList.toggle("active");
    });
  });
});
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFile;
    use kiln_build::scripts::ScriptMinifier;
    use kiln_build::{StaticBuilder, Task};
    use tempfile::tempdir;

    fn config_in(root: &Path) -> BuildConfig {
        BuildConfig {
            source_dir: root.join("src"),
            output_dir: root.join("out"),
            ..Default::default()
        }
    }

    #[test]
    fn scaffold_builds_cleanly() {
        let temp = tempdir().unwrap();
        let config = config_in(temp.path());

        let written = scaffold(&config, false).unwrap();
        assert_eq!(written.len(), 7);

        let summary = StaticBuilder::new(config).unwrap().build();

        assert!(summary.errors.is_empty(), "{:?}", summary.errors);
        assert_eq!(summary.failed(), 0);
        assert!(!summary.lint_failed());

        let out = temp.path().join("out");
        let index = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(index.contains("<title>My Site</title>"));
        assert!(index.contains("Where does this text come from?"));

        let about = fs::read_to_string(out.join("pages/about.html")).unwrap();
        assert!(about.contains("<title>About | My Site</title>"));

        assert!(out.join("styles/main.css").exists());
        assert!(!out.join("styles/_variables.css").exists());
        assert!(out.join("scripts/hamburger.js").exists());
    }

    #[test]
    fn scaffold_keeps_existing_files() {
        let temp = tempdir().unwrap();
        let config = config_in(temp.path());
        fs::create_dir_all(&config.source_dir).unwrap();
        fs::write(config.data_path(), "{\"site\": {}}").unwrap();

        let written = scaffold(&config, false).unwrap();

        assert_eq!(written.len(), 6);
        assert_eq!(fs::read_to_string(config.data_path()).unwrap(), "{\"site\": {}}");

        scaffold(&config, true).unwrap();
        assert_eq!(fs::read_to_string(config.data_path()).unwrap(), DEFAULT_DATA);
    }

    #[test]
    fn scaffold_lints_clean() {
        let temp = tempdir().unwrap();
        let config = config_in(temp.path());
        scaffold(&config, false).unwrap();

        let report = StaticBuilder::new(config).unwrap().run(Task::Lint).unwrap();

        assert_eq!(report.processed, 3);
        assert_eq!(report.issues, 0);
    }

    #[test]
    fn toggle_script_binds_both_behaviors() {
        assert!(HAMBURGER_JS.contains("document.querySelectorAll(\".hamburger-btn\")"));
        assert!(HAMBURGER_JS.contains("event.preventDefault()"));
        assert!(HAMBURGER_JS.contains("zone.classList.toggle(\"active\")"));
        assert!(HAMBURGER_JS.contains("item.querySelector(\".faq__question\")"));
        assert!(HAMBURGER_JS.contains("other.classList.remove(\"active\")"));
    }

    #[test]
    fn toggle_script_survives_minification() {
        let minified = ScriptMinifier::default().minify(HAMBURGER_JS).unwrap();

        assert!(minified.len() < HAMBURGER_JS.len());
        for needle in [
            "DOMContentLoaded",
            ".hamburger-btn",
            ".hamburger-zone",
            ".faq__item",
            ".faq__question",
            "preventDefault",
            "classList.toggle",
            "classList.remove",
            "active",
        ] {
            assert!(minified.contains(needle), "missing {needle} in {minified}");
        }
    }

    #[test]
    fn default_config_parses() {
        let parsed: ConfigFile = toml::from_str(DEFAULT_CONFIG).unwrap();
        let config = parsed.into_build_config();

        assert_eq!(config.source_dir, PathBuf::from("src"));
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.image_quality, 50);
    }
}
