use launchpad_core::contract::{
    AppDto, CoreRequest, CreateFolderRequest, FolderAppRequest, ItemDto, ListItemsRequest,
};
use launchpad_core::model::{AppRecord, Folder, FolderColor, IconHandle, LaunchpadItem};

#[test]
fn serializes_and_deserializes_create_folder_request() {
    let request = CoreRequest::CreateFolder(CreateFolderRequest {
        name: "Work".to_string(),
        color: Some(FolderColor::Purple),
    });

    let encoded = serde_json::to_string(&request).unwrap();
    let decoded: CoreRequest = serde_json::from_str(&encoded).unwrap();

    assert!(encoded.contains("\"kind\":\"CreateFolder\""));
    assert!(encoded.contains("\"color\":\"purple\""));
    assert_eq!(decoded, request);
}

#[test]
fn unit_scan_request_has_no_payload() {
    let decoded: CoreRequest = serde_json::from_str(r#"{"kind":"Scan"}"#).unwrap();
    assert_eq!(decoded, CoreRequest::Scan);
}

#[test]
fn list_items_search_defaults_to_empty() {
    let decoded: CoreRequest =
        serde_json::from_str(r#"{"kind":"ListItems","payload":{}}"#).unwrap();
    assert_eq!(
        decoded,
        CoreRequest::ListItems(ListItemsRequest {
            search: String::new()
        })
    );
}

#[test]
fn folder_app_request_round_trips() {
    let request = CoreRequest::AddToFolder(FolderAppRequest {
        id: "00000000-0000-4000-8000-000000000000".to_string(),
        bundle_identifier: "com.apple.Safari".to_string(),
    });

    let encoded = serde_json::to_string(&request).unwrap();
    assert_eq!(serde_json::from_str::<CoreRequest>(&encoded).unwrap(), request);
}

#[test]
fn app_dto_carries_icon_path_when_present() {
    let app = AppRecord::new(
        "Photos",
        "com.apple.Photos",
        "/System/Applications/Photos.app",
        Some(IconHandle::new("/System/Applications/Photos.app/Contents/Resources/AppIcon.icns")),
    );

    let dto = AppDto::from(&app);

    assert_eq!(dto.bundle_identifier, "com.apple.Photos");
    assert_eq!(
        dto.icon_path.as_deref(),
        Some("/System/Applications/Photos.app/Contents/Resources/AppIcon.icns")
    );
}

#[test]
fn item_dto_is_tagged_by_type() {
    let folder = Folder::new("Games", FolderColor::Green);
    let item = LaunchpadItem::Folder(folder.clone());

    let dto = ItemDto::from(&item);
    let encoded = serde_json::to_value(&dto).unwrap();

    assert_eq!(encoded["type"], "folder");
    assert_eq!(encoded["id"], format!("folder_{}", folder.id()));
    assert_eq!(encoded["folder"]["color"], "green");
}
