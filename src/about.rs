pub fn about() -> Vec<String> {
    vec![
        "Lights up Dynamic Lighting (LampArray) devices to show the state \
        of the Num Lock, Caps Lock and Scroll Lock keys."
            .to_string(),
        "\n".to_string(),
        "Each key gets one color while it is on and another while it is off. \
        Every other lamp uses the default color."
            .to_string(),
        format!("Version: {}", env!("CARGO_PKG_VERSION")),
    ]
}
