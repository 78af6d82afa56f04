//! Projectplace API access over OAuth 1.0a.
//!
//! A [`Connection`] is established from [`Credentials`]: a stored access token is used as is,
//! otherwise the three-legged handshake runs through an [`Authorizer`]. Every call is signed with
//! HMAC-SHA1 by the [`Signer`]; prepared calls can be fired concurrently as a batch.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod connection;
pub mod error;
pub mod handshake;
pub mod http;
pub mod obs;
pub mod provider;
pub mod sign;

#[cfg(feature = "reqwest")] pub use api::connect;
pub use api::{Profile, Project, ProjectQuery};
pub use auth::{Consumer, Credentials, Secret, Token};
pub use connection::{BatchHandle, BatchOutcome, BatchReport, Connection};
#[cfg(feature = "reqwest")] pub use connection::ReqwestConnection;
pub use error::{Error, Result};
pub use handshake::{Authorizer, ConsoleAuthorizer, HandshakeOptions, StaticVerifier};
pub use sign::{Method, Signer};

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
