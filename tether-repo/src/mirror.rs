//! Seeding one endpoint's repository from the other.
//!
//! Only the repository metadata directory travels; the destination working
//! tree is then forced to the copied HEAD. Rsyncing the metadata instead of
//! the working tree means partial transfers can never leave half-written
//! files that the next commit cycle would sync back.

use tracing::info;

use tether_core::transfer;

use crate::error::RepoError;
use crate::vcs::Vcs;

/// Copy `src`'s repository onto `dst` and check out its HEAD there.
pub async fn mirror(src: &Vcs, dst: &Vcs) -> Result<(), RepoError> {
    let Some(head) = src.head_hash().await? else {
        return Err(RepoError::NothingToMirror {
            endpoint: src.endpoint().name().to_string(),
            path: src.root().to_path_buf(),
        });
    };
    info!(
        from = %src.endpoint().label(),
        to = %dst.endpoint().label(),
        head = %head,
        "mirroring repository"
    );
    transfer(
        src.endpoint(),
        &src.repo_dir(),
        dst.endpoint(),
        &dst.repo_dir(),
        &[],
    )
    .await?;
    dst.hard_reset(&head).await?;
    Ok(())
}
