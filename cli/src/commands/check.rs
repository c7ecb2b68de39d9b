//! Connection check, following the same order as first-time setup: config,
//! token, repository, data file.

use crate::output;
use crate::runtime::Runtime;
use crate::ux_error;
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use tn_core::FetchOutcome;
use tn_core::traits::RemoteObjectStore;

#[derive(Debug, Serialize)]
struct CheckResult {
    name: &'static str,
    passed: bool,
    detail: String
}

impl CheckResult {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            passed: true,
            detail: detail.into()
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            passed: false,
            detail: detail.into()
        }
    }
}

async fn run_checks(runtime: &Runtime) -> Vec<CheckResult> {
    let mut results = Vec::new();

    if let Err(e) = runtime.config.require_remote() {
        results.push(CheckResult::fail("config", e.to_string()));
        return results;
    }
    results.push(CheckResult::pass("config", runtime.remote_label()));

    let Some(github) = &runtime.github else {
        results.push(CheckResult::fail("token", "remote disabled by --offline"));
        return results;
    };

    match github.verify_credentials().await {
        Ok(login) => results.push(CheckResult::pass("token", format!("authenticated as {login}"))),
        Err(e) => {
            results.push(CheckResult::fail("token", e.to_string()));
            return results;
        }
    }

    match github.verify_repository().await {
        Ok(()) => results.push(CheckResult::pass(
            "repository",
            format!("{}/{}", runtime.config.remote.owner, runtime.config.remote.repo)
        )),
        Err(e) => {
            results.push(CheckResult::fail("repository", e.to_string()));
            return results;
        }
    }

    let remote = &runtime.config.remote;
    match github.fetch_object(&remote.path, &remote.branch).await {
        Ok(FetchOutcome::Found(object)) => {
            results.push(CheckResult::pass("data", format!("found ({})", object.version)));
        }
        Ok(FetchOutcome::NotFound) => results.push(CheckResult::pass(
            "data",
            "not created yet; the first push creates it"
        )),
        Err(e) => results.push(CheckResult::fail("data", e.to_string()))
    }
    results
}

pub async fn run(runtime: &Runtime, json: bool) -> Result<()> {
    let results = run_checks(runtime).await;
    let passed = results.iter().all(|r| r.passed);

    if json {
        output::json(&serde_json::json!({ "passed": passed, "checks": results }))?;
    } else {
        output::header("tubenotes Check");
        println!();
        for result in &results {
            let mark = if result.passed { "✓".green() } else { "✗".red() };
            println!("  {} {:<11} {}", mark, result.name, result.detail.dimmed());
        }
        println!();
    }

    if passed {
        return Ok(());
    }
    let err = ux_error::remote_not_configured();
    if results.first().is_some_and(|r| r.name == "config" && !r.passed) {
        if !json {
            err.display();
        }
        return Err(err.into());
    }
    anyhow::bail!("Connection check failed")
}
