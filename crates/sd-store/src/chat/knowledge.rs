use sd_core::error::SdError;
use sd_core::knowledge::KnowledgeFile;
use sd_core::notify::Notice;
use sd_core::session::Page;
use std::path::Path;

use super::ChatStore;
use crate::report;

impl ChatStore {
    pub async fn load_knowledge_files(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Page<KnowledgeFile>, SdError> {
        let files = match self.inner.api.list_knowledge_files(page, page_size).await {
            Ok(files) => files,
            Err(e) => return Err(report(self.notifier(), "load knowledge files", e)),
        };

        let mut shared = self.shared();
        shared.state.knowledge_files = files.items.clone();
        shared.state.total_knowledge_files = files.total;
        Ok(files)
    }

    pub fn knowledge_files(&self) -> Vec<KnowledgeFile> {
        self.shared().state.knowledge_files.clone()
    }

    pub fn selected_knowledge_ids(&self) -> Vec<u64> {
        self.shared().state.selected_knowledge_ids.clone()
    }

    /// Add or remove a file from the next turn's context. Returns whether
    /// it is selected afterwards.
    pub fn toggle_knowledge_file(&self, id: u64) -> bool {
        let mut shared = self.shared();
        let selected = &mut shared.state.selected_knowledge_ids;
        match selected.iter().position(|&s| s == id) {
            Some(index) => {
                selected.remove(index);
                false
            }
            None => {
                selected.push(id);
                true
            }
        }
    }

    pub fn clear_selected_knowledge(&self) {
        self.shared().state.selected_knowledge_ids.clear();
    }

    pub async fn remove_knowledge_file(&self, id: u64) -> Result<(), SdError> {
        if let Err(e) = self.inner.api.delete_knowledge_file(id).await {
            return Err(report(self.notifier(), "delete file", e));
        }

        {
            let mut shared = self.shared();
            let before = shared.state.knowledge_files.len();
            shared.state.knowledge_files.retain(|f| f.id != id);
            if shared.state.knowledge_files.len() < before {
                shared.state.total_knowledge_files =
                    shared.state.total_knowledge_files.saturating_sub(1);
            }
            shared.state.selected_knowledge_ids.retain(|&s| s != id);
        }
        self.notifier().notify(Notice::success("File deleted"));
        Ok(())
    }

    /// Upload a local file to the knowledge base.
    pub async fn upload_knowledge_file(&self, path: &Path) -> Result<KnowledgeFile, SdError> {
        let file_name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => {
                let err = SdError::InvalidInput(format!("not a file path: {}", path.display()));
                return Err(report(self.notifier(), "upload file", err));
            }
        };
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let err = SdError::Io(format!("{}: {e}", path.display()));
                return Err(report(self.notifier(), "upload file", err));
            }
        };
        tracing::debug!(file = %file_name, size = bytes.len(), "uploading knowledge file");

        let file = match self.inner.api.upload_knowledge_file(&file_name, bytes).await {
            Ok(file) => file,
            Err(e) => return Err(report(self.notifier(), "upload file", e)),
        };

        {
            let mut shared = self.shared();
            shared.state.knowledge_files.insert(0, file.clone());
            shared.state.total_knowledge_files += 1;
        }
        self.notifier()
            .notify(Notice::success(format!("Uploaded {file_name}")));
        Ok(file)
    }

    /// Fetch one file's details, refreshing its entry in the list.
    pub async fn knowledge_file(&self, id: u64) -> Result<KnowledgeFile, SdError> {
        let file = match self.inner.api.knowledge_file(id).await {
            Ok(file) => file,
            Err(e) => return Err(report(self.notifier(), "load file details", e)),
        };

        let mut shared = self.shared();
        if let Some(slot) = shared.state.knowledge_files.iter_mut().find(|f| f.id == id) {
            *slot = file.clone();
        }
        Ok(file)
    }
}
