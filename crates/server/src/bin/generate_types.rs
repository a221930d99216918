use std::{env, fs, path::PathBuf};

use anyhow::{Context, bail};
use api_types::*;
use ts_rs::TS;

fn declarations() -> Vec<String> {
    vec![
        UserRole::decl(),
        UserStatus::decl(),
        PrincipalId::decl(),
        PrincipalInfo::decl(),
        LoginRequest::decl(),
        LoginResponse::decl(),
        CurrentUserResponse::decl(),
        PersonStatus::decl(),
        PersonProfile::decl(),
        CreatePersonRequest::decl(),
        UpdatePersonRequest::decl(),
        UpdatePersonRoleRequest::decl(),
        ListPeopleResponse::decl(),
        Project::decl(),
        CreateProjectRequest::decl(),
        UpdateProjectRequest::decl(),
        ListProjectsResponse::decl(),
        ToggleFavoriteResponse::decl(),
        ToggleStarResponse::decl(),
        ProjectMember::decl(),
        ProjectMemberRequest::decl(),
        ProjectMemberResponse::decl(),
        ListProjectMembersResponse::decl(),
        InvitationStatus::decl(),
        Invitation::decl(),
        CreateInvitationRequest::decl(),
        CreateInvitationResponse::decl(),
        InvitationPreview::decl(),
        AcceptInvitationRequest::decl(),
        AcceptInvitationResponse::decl(),
        NotificationType::decl(),
        NotificationCategory::decl(),
        Notification::decl(),
        ListNotificationsQuery::decl(),
        ListNotificationsResponse::decl(),
        MessageResponse::decl(),
    ]
}

fn render() -> String {
    let mut out = String::from(
        "// This file was generated by `cargo run --bin generate-types`.\n\
         // Do not edit it by hand.\n\n",
    );
    for decl in declarations() {
        out.push_str("export ");
        out.push_str(&decl);
        out.push_str("\n\n");
    }
    out
}

fn main() -> anyhow::Result<()> {
    let check = env::args().any(|arg| arg == "--check");
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../shared/types.ts");
    let rendered = render();

    if check {
        let current = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if current != rendered {
            bail!("{} is out of date; run generate-types", path.display());
        }
        println!("{} is up to date", path.display());
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&path, rendered).with_context(|| format!("failed to write {}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(())
}
