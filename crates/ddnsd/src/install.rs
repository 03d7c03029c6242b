// # systemd installer
//
// Writes three units into the unit directory:
// - `<name>.service`: oneshot running `<exe> run`
// - `<name>.timer`: fires the service every 5 minutes
// - `<name>.service.d/env.conf`: credentials and reconciliation settings
//
// The drop-in holds an AWS secret, so it is created with mode 0600 on unix.
// Nothing is enabled here; the caller prints the systemctl commands.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use ddns_core::config::{
    ENV_DNS_NAMES, ENV_TTL, ENV_ZONE_DNS_NAME, normalize_name, parse_host_names,
};
use ddns_core::{Error, ReconcileConfig};

use crate::cli::InstallArgs;

pub const DEFAULT_UNIT_DIR: &str = "/etc/systemd/system";
pub const DEFAULT_UNIT_NAME: &str = "route53-ddns";
pub const DEFAULT_TTL: u32 = 300;

/// Paths written by a successful install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledUnits {
    pub service: PathBuf,
    pub timer: PathBuf,
    pub env_conf: PathBuf,
    pub timer_unit: String,
}

impl InstalledUnits {
    /// Commands the operator runs to activate the timer
    pub fn activation_commands(&self) -> Vec<String> {
        vec![
            "systemctl daemon-reload".to_string(),
            format!("systemctl enable --now {}", self.timer_unit),
        ]
    }
}

/// Write the unit files for `exe`
pub fn install(args: &InstallArgs, exe: &Path) -> Result<InstalledUnits> {
    validate_unit_name(&args.name)?;

    if !args.skip_systemctl_check && find_in_path("systemctl", std::env::var_os("PATH")).is_none()
    {
        return Err(Error::config(
            "systemctl does not appear to be available on PATH \
            (pass --skip-systemctl-check to write the units anyway)",
        )
        .into());
    }

    let config = ReconcileConfig::new(
        normalize_name(&args.zone_dns_name),
        parse_host_names(&args.host_names)
            .iter()
            .map(|h| normalize_name(h))
            .collect(),
        args.ttl,
    );
    config.validate()?;

    let env_conf = render_env_conf(args, &config)?;
    let service = render_service(&args.name, exe)?;
    let timer = render_timer(&args.name);

    fs::create_dir_all(&args.unit_dir)
        .with_context(|| format!("Failed to create {}", args.unit_dir.display()))?;

    let service_path = args.unit_dir.join(format!("{}.service", args.name));
    info!("Installing {}", service_path.display());
    write_file(&service_path, &service, false)?;

    let timer_path = args.unit_dir.join(format!("{}.timer", args.name));
    info!("Installing {}", timer_path.display());
    write_file(&timer_path, &timer, false)?;

    let dropin_dir = args.unit_dir.join(format!("{}.service.d", args.name));
    fs::create_dir_all(&dropin_dir)
        .with_context(|| format!("Failed to create {}", dropin_dir.display()))?;
    let env_path = dropin_dir.join("env.conf");
    info!("Installing {}", env_path.display());
    write_file(&env_path, &env_conf, true)?;

    Ok(InstalledUnits {
        service: service_path,
        timer: timer_path,
        env_conf: env_path,
        timer_unit: format!("{}.timer", args.name),
    })
}

fn validate_unit_name(name: &str) -> ddns_core::Result<()> {
    let valid = !name.is_empty()
        && name.len() <= 200
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'));

    if valid {
        Ok(())
    } else {
        Err(Error::config(format!(
            "Unit name '{name}' is not valid. Use letters, digits, '-', '_', '.' or '@'"
        )))
    }
}

/// Locate an executable the way a shell would
pub fn find_in_path(program: &str, path_var: Option<OsString>) -> Option<PathBuf> {
    let path_var = path_var?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

pub fn render_service(name: &str, exe: &Path) -> ddns_core::Result<String> {
    let exe = exe.to_str().ok_or_else(|| {
        Error::config(format!("Executable path {} is not valid UTF-8", exe.display()))
    })?;
    reject_control_chars("executable path", exe)?;

    Ok(format!(
        "[Unit]\n\
        Description={name}: Route 53 dynamic DNS update\n\
        Wants=network-online.target\n\
        After=network-online.target\n\
        \n\
        [Service]\n\
        Type=oneshot\n\
        ExecStart=\"{}\" run\n",
        escape_unit_value(exe)
    ))
}

pub fn render_timer(name: &str) -> String {
    format!(
        "[Unit]\n\
        Description=Run {name}.service every 5 minutes\n\
        \n\
        [Timer]\n\
        OnCalendar=*:0/5\n\
        Persistent=true\n\
        Unit={name}.service\n\
        \n\
        [Install]\n\
        WantedBy=timers.target\n"
    )
}

pub fn render_env_conf(args: &InstallArgs, config: &ReconcileConfig) -> ddns_core::Result<String> {
    let entries = [
        ("AWS_ACCESS_KEY_ID", args.aws_access_key_id.trim().to_string()),
        ("AWS_SECRET_ACCESS_KEY", args.aws_secret_access_key.trim().to_string()),
        (ENV_ZONE_DNS_NAME, config.zone_dns_name.clone()),
        (ENV_DNS_NAMES, config.host_names.join(",")),
        (ENV_TTL, config.ttl.to_string()),
    ];

    let mut out = String::from("[Service]\n");
    for (key, value) in entries {
        if value.is_empty() {
            return Err(Error::config(format!("{key} must not be empty")));
        }
        reject_control_chars(key, &value)?;
        out.push_str(&format!("Environment=\"{key}={}\"\n", escape_unit_value(&value)));
    }
    Ok(out)
}

fn reject_control_chars(what: &str, value: &str) -> ddns_core::Result<()> {
    if value.chars().any(char::is_control) {
        return Err(Error::config(format!("{what} contains control characters")));
    }
    Ok(())
}

/// Escape a value for a double-quoted unit-file setting
fn escape_unit_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '%' => out.push_str("%%"),
            other => out.push(other),
        }
    }
    out
}

fn write_file(path: &Path, contents: &str, secret: bool) -> Result<()> {
    let mut file = open_for_write(path, secret)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(unix)]
fn open_for_write(path: &Path, secret: bool) -> std::io::Result<fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    if secret {
        options.mode(0o600);
    }
    let file = options.open(path)?;

    // mode() only applies on creation; tighten a pre-existing file too
    if secret {
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    Ok(file)
}

#[cfg(not(unix))]
fn open_for_write(path: &Path, _secret: bool) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}
