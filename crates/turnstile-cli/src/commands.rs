//! Command implementations
//!
//! Every command except `create` attaches to the existing record without
//! reseeding it, so separate invocations act like separate participants.

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use turnstile_common::CounterStore;
use turnstile_core::{LockHandle, LockOptions};

use crate::cli::Command;

/// Run `command`; returns `false` when a non-blocking acquire did not get the lock
pub async fn execute(
    command: &Command,
    store: Arc<dyn CounterStore>,
    options: LockOptions,
    out: &mut dyn Write,
) -> anyhow::Result<bool> {
    let name = command.lock_name();

    match command {
        Command::Create(_) => {
            LockHandle::create(name, store, options)
                .await
                .with_context(|| format!("failed to create lock '{}'", name))?;
            writeln!(out, "created {}", name)?;
        }
        Command::Acquire(args) => {
            let handle = LockHandle::open(name, store, options);
            let acquired = handle
                .acquire(!args.no_wait)
                .await
                .with_context(|| format!("failed to acquire lock '{}'", name))?;
            if !acquired {
                // The ticket stays registered until a matching release
                writeln!(out, "busy {}", name)?;
                return Ok(false);
            }
            writeln!(out, "acquired {}", name)?;
        }
        Command::Release(_) => {
            LockHandle::open(name, store, options)
                .release()
                .await
                .with_context(|| format!("failed to release lock '{}'", name))?;
            writeln!(out, "released {}", name)?;
        }
        Command::Initialize(_) => {
            LockHandle::open(name, store, options)
                .initialize()
                .await
                .with_context(|| format!("failed to initialize lock '{}'", name))?;
            writeln!(out, "initialized {}", name)?;
        }
        Command::Close(_) => {
            info!(lock = %name, "Closing lock, waiting for participants to drain");
            LockHandle::open(name, store, options)
                .close()
                .await
                .with_context(|| format!("failed to close lock '{}'", name))?;
            writeln!(out, "closed {}", name)?;
        }
        Command::Inspect(_) => {
            let snapshot = LockHandle::open(name, store, options).snapshot().await?;
            writeln!(out, "{}", serde_json::to_string_pretty(&snapshot)?)?;
        }
    }

    Ok(true)
}
