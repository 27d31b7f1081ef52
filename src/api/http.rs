// src/api/http.rs

use async_trait::async_trait;
use reqwest::{Response, StatusCode, multipart};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    api::{AssessmentPatch, CohortAssignRequest, RemoteSync, RosterUpload, StudentAssignRequest},
    config::Config,
    error::AdminError,
    models::{assessment::Assessment, group::Group, student::Student},
};

/// Successful payloads arrive wrapped as `{ "data": ... }`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct GroupsPayload {
    groups: Vec<Group>,
}

/// reqwest-backed implementation of the remote API contract.
pub struct HttpSync {
    http: reqwest::Client,
    base_url: Url,
    token: String,
}

impl HttpSync {
    pub fn new(config: &Config) -> Result<Self, AdminError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| AdminError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            token: config.api_token.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, AdminError> {
        self.base_url
            .join(path)
            .map_err(|e| AdminError::Transport(format!("invalid endpoint '{}': {}", path, e)))
    }

    /// Unwraps a JSON envelope on any 2xx status. The API answers 200
    /// on some revisions and 201 on others, so both are accepted.
    async fn parse_data<T: DeserializeOwned>(response: Response) -> Result<T, AdminError> {
        if !response.status().is_success() {
            return Err(Self::remote_failure(response).await);
        }

        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.data)
    }

    async fn expect_success(response: Response) -> Result<(), AdminError> {
        if !response.status().is_success() {
            return Err(Self::remote_failure(response).await);
        }
        Ok(())
    }

    /// Builds a `Remote` error, pulling the human-readable message out
    /// of the JSON body when the server provided one.
    async fn remote_failure(response: Response) -> AdminError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("error")
                    .or_else(|| v.get("message"))
                    .and_then(|m| m.as_str())
                    .map(String::from)
            })
            .unwrap_or(body);

        AdminError::Remote { status, message }
    }
}

#[async_trait]
impl RemoteSync for HttpSync {
    async fn fetch_assessment(&self, id: &str) -> Result<Assessment, AdminError> {
        let url = self.endpoint(&format!("school/assessment/{}", id))?;
        let response = self.http.get(url).bearer_auth(&self.token).send().await?;

        Self::parse_data(response).await
    }

    async fn fetch_groups(&self) -> Result<Vec<Group>, AdminError> {
        let url = self.endpoint("school/groups")?;
        let response = self.http.get(url).bearer_auth(&self.token).send().await?;

        let payload: GroupsPayload = Self::parse_data(response).await?;
        Ok(payload.groups)
    }

    async fn update_assessment(
        &self,
        id: &str,
        patch: &AssessmentPatch,
    ) -> Result<Assessment, AdminError> {
        let url = self.endpoint(&format!("school/assessment/{}", id))?;
        let response = self
            .http
            .patch(url)
            .bearer_auth(&self.token)
            .json(patch)
            .send()
            .await?;

        Self::parse_data(response).await
    }

    async fn authorize_assessment(&self, id: &str) -> Result<Assessment, AdminError> {
        let url = self.endpoint(&format!("school/assessment/{}/authorize", id))?;
        let response = self.http.patch(url).bearer_auth(&self.token).send().await?;

        Self::parse_data(response).await
    }

    async fn end_assessment(
        &self,
        id: &str,
        reason: Option<&str>,
    ) -> Result<Assessment, AdminError> {
        let url = self.endpoint(&format!("school/assessment/{}/end", id))?;
        let mut request = self.http.patch(url).bearer_auth(&self.token);

        if let Some(reason) = reason {
            request = request.json(&serde_json::json!({ "endReason": reason }));
        }

        Self::parse_data(request.send().await?).await
    }

    async fn delete_assessment(&self, id: &str) -> Result<(), AdminError> {
        let url = self.endpoint(&format!("school/assessment/{}", id))?;
        let response = self.http.delete(url).bearer_auth(&self.token).send().await?;

        Self::expect_success(response).await
    }

    async fn assign_cohort(
        &self,
        id: &str,
        request: &CohortAssignRequest,
    ) -> Result<(), AdminError> {
        let url = self.endpoint(&format!("school/assessment/{}/assign", id))?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await?;

        Self::expect_success(response).await
    }

    async fn assign_students(
        &self,
        id: &str,
        request: &StudentAssignRequest,
    ) -> Result<(), AdminError> {
        let url = self.endpoint(&format!("school/assessment/{}/assign-students", id))?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await?;

        Self::expect_success(response).await
    }

    async fn search_students_by_reg_number(
        &self,
        reg_number: &str,
    ) -> Result<Vec<Student>, AdminError> {
        let mut url = self.endpoint("student/all")?;
        url.query_pairs_mut()
            .append_pair("searchByRegNumber", reg_number);

        let response = self.http.get(url).bearer_auth(&self.token).send().await?;

        Self::parse_data(response).await
    }

    async fn export_results(&self, id: &str) -> Result<Vec<u8>, AdminError> {
        let url = self.endpoint(&format!("school/assessment/{}/export", id))?;
        let response = self.http.get(url).bearer_auth(&self.token).send().await?;

        // 400 is the documented "results not prepared yet" answer,
        // distinct from a generic remote failure.
        if response.status() == StatusCode::BAD_REQUEST {
            return Err(AdminError::NotReady);
        }
        if !response.status().is_success() {
            return Err(Self::remote_failure(response).await);
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn bulk_upload_students(&self, upload: RosterUpload) -> Result<String, AdminError> {
        let url = self.endpoint("student/bulk-upload")?;

        let file = multipart::Part::bytes(upload.bytes).file_name(upload.file_name);
        let form = multipart::Form::new()
            .part("file", file)
            .text("group", upload.group)
            .text("subGroup", upload.sub_group);

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::remote_failure(response).await);
        }

        let body: serde_json::Value = response.json().await?;
        let message = body
            .pointer("/data/message")
            .or_else(|| body.get("message"))
            .and_then(|m| m.as_str())
            .unwrap_or("upload accepted")
            .to_string();

        Ok(message)
    }
}
