use super::config::default_store_path;
use std::path::PathBuf;
use tether::gateway::DeviceStore;

/// Report whether this client holds a device identity
pub async fn execute(store_path: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let store_path = store_path.map(PathBuf::from).unwrap_or_else(default_store_path);

    println!("Tether device status");
    println!();
    println!("Store: {}", store_path.display());

    if !store_path.exists() {
        println!("No device store found.");
        println!("Run 'tether run' to pair this device with your account.");
        return Ok(());
    }

    let store = DeviceStore::open(&store_path).await?;
    match store.device_identity().await? {
        Some(identity) => {
            println!("Linked: device {}", identity.device_id);
            println!("Created: {} (ms since epoch)", identity.created_at_ms);
        }
        None => {
            println!("Store present, but no device identity.");
            println!("Run 'tether run' to pair this device with your account.");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn status_with_missing_store() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("device.db");

        let result = execute(Some(path.to_string_lossy().to_string())).await;
        assert!(result.is_ok());
        // Status must not create the store as a side effect
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn status_with_empty_store() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("device.db");
        DeviceStore::open(&path).await.unwrap();

        let result = execute(Some(path.to_string_lossy().to_string())).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn status_with_linked_device() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("device.db");
        let store = DeviceStore::open(&path).await.unwrap();
        store.create_identity("device-42").await.unwrap();

        let result = execute(Some(path.to_string_lossy().to_string())).await;
        assert!(result.is_ok());
    }
}
