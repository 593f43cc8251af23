pub fn send_transport_failure(port: &str, reason: &str) {
    #[cfg(unix)]
    {
        use notify_rust::Notification;

        let result = Notification::new()
            .summary("Thermal Relay - display link lost")
            .body(&format!("Stopped sending to {}: {}", port, reason))
            .icon("dialog-warning")
            .timeout(5000)
            .show();

        if let Err(e) = result {
            log::debug!("Desktop notification failed: {}", e);
        }
    }

    #[cfg(not(unix))]
    {
        log::warn!("Display link lost on {}: {}", port, reason);
    }
}

pub fn send_status_update(status_line: &str, link: &str) {
    #[cfg(unix)]
    {
        use notify_rust::Notification;

        let _ = Notification::new()
            .summary("Thermal Relay Status")
            .body(&format!("{}\nLink: {}", status_line, link))
            .icon("thermal-relay")
            .timeout(3000)
            .show();
    }

    #[cfg(not(unix))]
    {
        log::info!("Status: {} | Link: {}", status_line, link);
    }
}
