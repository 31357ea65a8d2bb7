//! Typosquat detection against a list of popular package names

/// Popular npm packages commonly targeted by typosquatters
pub const POPULAR_PACKAGES: &[&str] = &[
    // Top downloads
    "lodash", "react", "react-dom", "express", "axios", "typescript",
    "webpack", "next", "vue", "angular", "moment", "jquery",
    "chalk", "commander", "debug", "request", "async", "bluebird",
    // Common frameworks
    "svelte", "nuxt", "gatsby", "redux", "mobx", "rxjs",
    "passport", "socket.io", "ws", "cors", "helmet", "morgan",
    // Testing & build tools
    "jest", "mocha", "chai", "jasmine", "karma", "ava",
    "eslint", "prettier", "babel", "rollup", "parcel", "vite",
    "esbuild", "gulp", "grunt", "webpack-cli", "nodemon",
    // Type definitions
    "@types/node", "@types/react", "@types/express", "@types/jest",
    // Angular ecosystem
    "@angular/core", "@angular/common", "@angular/router",
    "@angular/forms", "@angular/http", "@angular/platform-browser",
    // Babel ecosystem
    "@babel/core", "@babel/preset-env", "@babel/preset-react",
    "@babel/preset-typescript", "@babel/plugin-transform-runtime",
    // React ecosystem
    "react-router", "react-router-dom", "prop-types", "classnames",
    "react-scripts", "create-react-app", "styled-components",
    // Node.js core utilities
    "dotenv", "fs-extra", "path", "util", "url", "querystring",
    "body-parser", "cookie-parser", "multer", "busboy",
    // Database & ORM
    "mongoose", "sequelize", "typeorm", "prisma", "knex",
    "pg", "mysql", "redis", "mongodb", "sqlite3",
    // Authentication & security
    "jsonwebtoken", "bcrypt", "bcryptjs", "passport-local",
    "passport-jwt", "express-session", "connect-redis",
    // HTTP clients & servers
    "node-fetch", "got", "superagent", "http-proxy",
    "http-server", "serve", "express-static",
    // Date & time
    "dayjs", "date-fns", "luxon", "moment-timezone",
    // Validation
    "joi", "yup", "ajv", "validator", "class-validator",
    // Historical attack targets
    "event-stream", "ua-parser-js", "colors", "faker", "node-ipc",
    "is-promise", "flatmap-stream", "getcookies", "crossenv",
];

/// Normalize a package name for comparison: lowercase, scope prefix
/// stripped, underscores mapped to hyphens.
pub fn normalize_name(name: &str) -> String {
    let mut normalized = name.trim().to_lowercase();

    if normalized.starts_with('@') {
        if let Some((_, rest)) = normalized.split_once('/') {
            normalized = rest.to_string();
        }
    }

    normalized.replace('_', "-")
}

/// Check a package name against the popular-package list.
///
/// Returns `(popular_name, similarity)` pairs at or above the threshold,
/// sorted by similarity (highest first). An exact match is not a typosquat
/// and returns no matches.
pub fn check_typosquatting(name: &str, threshold: f64) -> Vec<(&'static str, f64)> {
    let normalized = normalize_name(name);

    if POPULAR_PACKAGES.iter().any(|&p| p == normalized) {
        return Vec::new();
    }

    let mut matches: Vec<(&'static str, f64)> = POPULAR_PACKAGES
        .iter()
        .filter_map(|&popular| {
            let ratio = similarity(&normalized, popular);
            (ratio >= threshold).then_some((popular, ratio))
        })
        .collect();

    matches.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    matches
}

/// Similarity ratio in [0, 1] based on edit distance.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (edit_distance(a, b) as f64 / max_len as f64)
}

/// Optimal-string-alignment edit distance: insertions, deletions,
/// substitutions, and adjacent transpositions each cost 1.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (m, n) = (a.len(), b.len());

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut dist = vec![vec![0usize; n + 1]; m + 1];
    for (i, row) in dist.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=n {
        dist[0][j] = j;
    }

    for i in 1..=m {
        for j in 1..=n {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            dist[i][j] = (dist[i - 1][j] + 1)
                .min(dist[i][j - 1] + 1)
                .min(dist[i - 1][j - 1] + cost);

            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                dist[i][j] = dist[i][j].min(dist[i - 2][j - 2] + 1);
            }
        }
    }

    dist[m][n]
}
