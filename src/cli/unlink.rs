use super::config::default_store_path;
use std::path::PathBuf;
use tether::gateway::DeviceStore;

/// Remove the local device identity
///
/// Only local data is touched; the account is untouched and the gateway
/// drops the dead device from the registry on its next sweep.
pub async fn execute(
    store_path: Option<String>,
    yes: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let store_path = store_path.map(PathBuf::from).unwrap_or_else(default_store_path);

    if !yes {
        println!(
            "This removes the local device identity at {}.",
            store_path.display()
        );
        println!("Your account is untouched. Re-run with --yes to confirm.");
        return Ok(());
    }

    if !store_path.exists() {
        println!("No device store at {}.", store_path.display());
        return Ok(());
    }

    let store = DeviceStore::open(&store_path).await?;
    if store.delete_identity().await? {
        println!("Device identity removed.");
        println!("Run 'tether run' to pair again.");
    } else {
        println!("No device identity was stored.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn without_yes_nothing_is_deleted() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("device.db");
        let store = DeviceStore::open(&path).await.unwrap();
        store.create_identity("device-1").await.unwrap();

        execute(Some(path.to_string_lossy().to_string()), false)
            .await
            .unwrap();

        assert!(store.device_identity().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn with_yes_identity_is_removed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("device.db");
        let store = DeviceStore::open(&path).await.unwrap();
        store.create_identity("device-1").await.unwrap();

        execute(Some(path.to_string_lossy().to_string()), true)
            .await
            .unwrap();

        assert!(store.device_identity().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_store_is_not_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("device.db");

        execute(Some(path.to_string_lossy().to_string()), true)
            .await
            .unwrap();

        assert!(!path.exists());
    }
}
