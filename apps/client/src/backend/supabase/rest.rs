use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use super::{error_from_response, SupabaseClient};
use crate::errors::ClientError;
use crate::models::resume::{NewResume, Resume, ResumePatch, ResumeSummary};
use crate::models::user::Session;

const RESUMES: &str = "rest/v1/resumes";
/// Asks PostgREST for exactly one object; zero rows become a 406.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

#[derive(Debug, Deserialize)]
struct InsertedRow {
    id: Uuid,
}

impl SupabaseClient {
    pub(super) async fn select_resumes(
        &self,
        session: &Session,
    ) -> Result<Vec<ResumeSummary>, ClientError> {
        let url = self.url(RESUMES);
        debug!("GET {url} (list)");
        let response = self
            .authed(self.client.get(&url), session)
            .query(&[("select", "id,title,updated_at"), ("order", "updated_at.desc")])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(response.json().await?)
    }

    pub(super) async fn select_resume(
        &self,
        session: &Session,
        id: Uuid,
    ) -> Result<Resume, ClientError> {
        let url = self.url(RESUMES);
        debug!("GET {url} id={id}");
        let response = self
            .authed(self.client.get(&url), session)
            .header("accept", SINGLE_OBJECT)
            .query(&[("select", "*".to_string()), ("id", format!("eq.{id}"))])
            .send()
            .await?;
        if response.status().as_u16() == 406 {
            // PGRST116: the row does not exist or is not visible to this user.
            return Err(ClientError::NotFound(format!("Resume {id} not found")));
        }
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(response.json().await?)
    }

    pub(super) async fn insert_resume_row(
        &self,
        session: &Session,
        new: &NewResume,
    ) -> Result<Uuid, ClientError> {
        let url = self.url(RESUMES);
        debug!("POST {url}");
        let response = self
            .authed(self.client.post(&url), session)
            .header("prefer", "return=representation")
            .header("accept", SINGLE_OBJECT)
            .query(&[("select", "id")])
            .json(new)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        let row: InsertedRow = response.json().await?;
        Ok(row.id)
    }

    pub(super) async fn patch_resume_row(
        &self,
        session: &Session,
        id: Uuid,
        patch: &ResumePatch,
    ) -> Result<(), ClientError> {
        let url = self.url(RESUMES);
        debug!("PATCH {url} id={id} fields={:?}", patch.changed_fields());
        let response = self
            .authed(self.client.patch(&url), session)
            .header("prefer", "return=minimal")
            .query(&[("id", format!("eq.{id}"))])
            .json(patch)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(())
    }

    pub(super) async fn delete_resume_row(
        &self,
        session: &Session,
        id: Uuid,
    ) -> Result<(), ClientError> {
        let url = self.url(RESUMES);
        debug!("DELETE {url} id={id}");
        let response = self
            .authed(self.client.delete(&url), session)
            .query(&[("id", format!("eq.{id}"))])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(())
    }
}
