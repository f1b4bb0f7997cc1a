use serde::{Deserialize, Serialize};

use crate::services::preference_service::PreferenceKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceResponse {
    pub kind: PreferenceKind,
    pub id: String,
    pub marked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Notification text shown after a toggle.
pub fn toggle_message(kind: PreferenceKind, marked: bool) -> &'static str {
    match (kind, marked) {
        (PreferenceKind::FavoriteJob, true) => "お気に入りに追加しました",
        (PreferenceKind::FavoriteJob, false) => "お気に入りから削除しました",
        (PreferenceKind::FavoriteCompany, true) => "お気に入り企業に追加しました",
        (PreferenceKind::FavoriteCompany, false) => "お気に入り企業から削除しました",
        (PreferenceKind::FollowCompany, true) => "求人通知を有効にしました",
        (PreferenceKind::FollowCompany, false) => "求人通知を無効にしました",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkedIdsResponse {
    pub kind: PreferenceKind,
    pub ids: Vec<String>,
}
