//! Translation of SIMPLE methods into Program Expression Graphs.
//!
//! Input programs arrive as a JSON AST ([`ast`]). The [`Translator`] walks a
//! method body in evaluation order, threading a [`PegContext`] (locals, heap
//! and pending exception exits) and interning every value it computes into a
//! shared [`mutpeg_core::NodeStore`]. The [`Session`] drives whole batches of
//! subjects and mutants and produces a [`Report`].

pub mod ast;
pub mod config;
pub mod context;
pub mod error;
pub mod expr;
pub mod report;
pub mod session;
pub mod stmt;
pub mod translator;
pub mod validate;

pub use ast::{BinaryOp, ClassDecl, Declarator, Expr, FieldDecl, MethodDecl, Param, Stmt, UnaryOp};
pub use config::{ConfigError, TranslateConfig};
pub use context::PegContext;
pub use error::{TranslateError, ValidationError};
pub use expr::ExprResult;
pub use report::{MutantOutcome, MutantRecord, NodeRecord, Report, ReportError, SubjectRecord};
pub use session::{Mutant, Session, SessionError, SessionStats, Subject, SubjectFile};
pub use translator::{ClassTranslation, Translator};
pub use validate::{is_supported, validate_method};
