//! Typed helpers over a few well-known Projectplace resources.

// crates.io
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
// self
#[cfg(feature = "reqwest")]
use crate::{auth::Credentials, connection::ReqwestConnection, handshake::ConsoleAuthorizer};
use crate::{_prelude::*, connection::Connection, http::ApiTransport};

/// Path of the authenticated user's profile.
pub const PROFILE_PATH: &str = "/1/user/me/profile.json";
/// Path of the projects visible to the authenticated user.
pub const PROJECTS_PATH: &str = "/1/user/me/projects.json";

/// Connects over reqwest, prompting on the console when no access token is stored.
#[cfg(feature = "reqwest")]
pub async fn connect(credentials: Credentials) -> Result<ReqwestConnection> {
	ReqwestConnection::connect(credentials, &ConsoleAuthorizer::default()).await
}

/// Basic profile of the user the access token belongs to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
	/// Account id.
	#[serde(default)]
	pub id: Option<i64>,
	/// Given name.
	pub first_name: String,
	/// Family name.
	pub last_name: String,
	/// Primary email address.
	pub email: String,
	/// Remaining fields, untouched.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}
impl Profile {
	/// `first_name last_name`.
	pub fn full_name(&self) -> String {
		format!("{} {}", self.first_name, self.last_name)
	}
}

/// Project visible to the authenticated user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
	/// Project id.
	pub id: i64,
	/// Display name.
	pub name: String,
	/// Remaining fields, untouched.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// Selector for [`Connection::find_project`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProjectQuery {
	/// Case-insensitive name match.
	Name(String),
	/// Exact id match.
	Id(i64),
}
impl ProjectQuery {
	/// Returns `true` when `project` satisfies the query.
	pub fn matches(&self, project: &Project) -> bool {
		match self {
			ProjectQuery::Name(name) => project.name.to_lowercase() == name.to_lowercase(),
			ProjectQuery::Id(id) => project.id == *id,
		}
	}
}

impl<T> Connection<T>
where
	T: ?Sized + ApiTransport,
{
	/// Fetches the profile of the authorized user.
	pub async fn get_me(&self) -> Result<Profile> {
		self.get_json(PROFILE_PATH).await
	}

	/// Lists every project visible to the authorized user.
	pub async fn get_projects(&self) -> Result<Vec<Project>> {
		self.get_json(PROJECTS_PATH).await
	}

	/// Returns the first project matching `query`, if any.
	pub async fn find_project(&self, query: ProjectQuery) -> Result<Option<Project>> {
		let projects = self.get_projects().await?;

		Ok(projects.into_iter().find(|project| query.matches(project)))
	}

	async fn get_json<R>(&self, path: &str) -> Result<R>
	where
		R: DeserializeOwned,
	{
		let response = self.request("GET", path, &[], "").await?;

		if response.status != 200 {
			return Err(Error::Upstream { status: response.status, body: response.text() });
		}

		response.json()
	}
}
