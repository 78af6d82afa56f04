//! Connects with credentials from the `PPAPI_*` environment variables and prints who the access
//! token belongs to.
//!
//! Without `PPAPI_OAUTH_TOKEN`/`PPAPI_OAUTH_TOKEN_SECRET` the console handshake runs first; store
//! the printed token afterwards to skip it next time.

// crates.io
use color_eyre::Result;
// self
use ppapi_access::{Credentials, api};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let credentials = Credentials::from_env()?;
	let had_token = credentials.access_token().is_some();
	let connection = api::connect(credentials).await?;

	if !had_token {
		let token = connection.access_token();

		println!("Store these to skip the handshake next time:");
		println!(" - PPAPI_OAUTH_TOKEN={}", token.key);
		println!(" - PPAPI_OAUTH_TOKEN_SECRET={}", token.secret.expose());
	}

	let me = connection.get_me().await?;
	let projects = connection.get_projects().await?;

	println!();
	println!("Info fetched via API regarding current user:");
	println!(" - Name: {}", me.full_name());
	println!(" - Email: {}", me.email);
	println!(" - Number of available projects: {}", projects.len());

	Ok(())
}
