use sd_core::error::ApiError;
use sd_core::knowledge::KnowledgeFile;
use sd_core::session::Page;

use crate::client::ApiClient;
use crate::transport::{Body, Method};
use crate::wire;

impl ApiClient {
    pub async fn list_knowledge_files(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Page<KnowledgeFile>, ApiError> {
        let body = self
            .get(
                "/knowledge/files",
                vec![
                    ("page".into(), page.to_string()),
                    ("page_size".into(), page_size.to_string()),
                ],
            )
            .await?;
        wire::decode_page(body, "files", page, page_size)
    }

    pub async fn knowledge_file(&self, id: u64) -> Result<KnowledgeFile, ApiError> {
        let body = self.get(&format!("/knowledge/files/{id}"), vec![]).await?;
        wire::decode_data(body)
    }

    pub async fn delete_knowledge_file(&self, id: u64) -> Result<(), ApiError> {
        self.delete(&format!("/knowledge/files/{id}")).await?;
        Ok(())
    }

    pub async fn upload_knowledge_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<KnowledgeFile, ApiError> {
        let body = self
            .request(
                Method::Post,
                "/knowledge/upload",
                vec![],
                Body::File {
                    field: "file".into(),
                    file_name: file_name.to_string(),
                    bytes,
                },
            )
            .await?;
        wire::decode_data(body)
    }
}
