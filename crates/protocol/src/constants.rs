use serde::{Deserialize, Serialize};

/// Remote store service method identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoreMethod {
    // Writes (fire-and-forget, confirmed through certified state)
    #[serde(rename = "put")]
    Put,

    // Reads
    #[serde(rename = "getPlain")]
    GetPlain,
    #[serde(rename = "getCipher")]
    GetCipher,
    #[serde(rename = "getAssetextkey")]
    GetAssetMeta,
    #[serde(rename = "getPageFiles")]
    GetPageFiles,
    #[serde(rename = "getFileNums")]
    GetFileNums,
    #[serde(rename = "canisterState")]
    BoxState,

    // Management
    #[serde(rename = "deleteFileFromKey")]
    DeleteFile,
    #[serde(rename = "clearall")]
    ClearAll,
    #[serde(rename = "setPlainFilePubOrPri")]
    SetVisibility,
    #[serde(rename = "addPrivatePlainShare")]
    AddPrivateShare,
    #[serde(rename = "removePrivatePlainShare")]
    RemovePrivateShare,
}

impl StoreMethod {
    /// Returns the method name as the remote store expects it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Put => "put",
            Self::GetPlain => "getPlain",
            Self::GetCipher => "getCipher",
            Self::GetAssetMeta => "getAssetextkey",
            Self::GetPageFiles => "getPageFiles",
            Self::GetFileNums => "getFileNums",
            Self::BoxState => "canisterState",
            Self::DeleteFile => "deleteFileFromKey",
            Self::ClearAll => "clearall",
            Self::SetVisibility => "setPlainFilePubOrPri",
            Self::AddPrivateShare => "addPrivatePlainShare",
            Self::RemovePrivateShare => "removePrivatePlainShare",
        }
    }
}

impl std::fmt::Display for StoreMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_name_matches_as_str() {
        for method in [
            StoreMethod::Put,
            StoreMethod::GetPlain,
            StoreMethod::GetCipher,
            StoreMethod::GetAssetMeta,
            StoreMethod::GetPageFiles,
            StoreMethod::DeleteFile,
            StoreMethod::SetVisibility,
        ] {
            let json = serde_json::to_string(&method).unwrap();
            assert_eq!(json, format!("\"{}\"", method.as_str()));
        }
    }
}
