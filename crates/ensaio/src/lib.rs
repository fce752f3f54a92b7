//! Ensaio: step-driven browser testing for the ERP web client.
//!
//! Ensaio (Portuguese: "rehearsal") executes declarative step scripts
//! against a bilingual single-page ERP client and decides, per step,
//! whether the target element exists, whether the dispatched action had
//! its intended effect, and how to fail with enough evidence to debug a
//! flaky UI.
//!
//! # Pipeline
//!
//! ```text
//! ┌──────────┐   ┌─────────────┐   ┌────────────┐   ┌──────────┐   ┌──────────┐
//! │ Resolver │──►│ Pre-Action  │──►│ Dispatcher │──►│ Verifier │──►│ Recorder │
//! │          │   │ Validator   │   │            │   │          │   │          │
//! └──────────┘   └──────┬──────┘   └────────────┘   └────┬─────┘   └──────────┘
//!                       │         blocking failure       │
//!                       └──────────► Diagnostics ◄───────┘
//! ```
//!
//! Steps run strictly in sequence against one live page; a blocking
//! failure (unresolved target for a blocking action, unaccepted
//! navigation) writes a markup artifact and aborts the rest of the run.
//!
//! # Example
//!
//! ```no_run
//! use ensaio::{FakePage, Script, StepRunner};
//!
//! # async fn demo() -> ensaio::EnsaioResult<()> {
//! let script = Script::from_yaml(r#"
//! name: "smoke"
//! steps:
//!   - action: goto
//!     target: "Vendas > Pedidos"
//!   - action: click
//!     target: "Confirmar"
//! "#)?;
//!
//! let page = FakePage::new();
//! let report = StepRunner::new(&page).run(&script).await;
//! assert!(report.passed);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays))]

pub mod diagnostics;
pub mod dispatch;
pub mod driver;
pub mod probe;
pub mod recorder;
pub mod resolve;
pub mod result;
pub mod runner;
pub mod script;
pub mod step;
pub mod target;
pub mod validate;

#[cfg(feature = "browser")]
pub mod cdp;

pub use diagnostics::DiagnosticsCapturer;
pub use driver::{ElementHandle, FakeElement, FakePage, FieldHandle, FieldKind, PageDriver, Scope};
pub use probe::Probe;
pub use recorder::{OutcomeRecorder, RunReport, StepRecord, StepStatus};
pub use resolve::{ResolutionResult, Strategy, TargetResolver};
pub use result::{EnsaioError, EnsaioResult};
pub use runner::{RunnerConfig, StepRunner};
pub use script::Script;
pub use step::{ActionKind, ExecContext, Step, StepOutcome};
pub use target::{TargetClass, TargetDescription};
pub use validate::{MenuPath, NavState, PreparedAction, VerificationVerdict};

#[cfg(feature = "browser")]
pub use cdp::{BrowserOptions, BrowserSession, CdpDriver};
