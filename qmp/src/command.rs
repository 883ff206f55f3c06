use serde::Serialize;
use serde_json::Value;

/// Host-side file backing for a block node.
#[derive(Debug, Clone, Serialize)]
pub struct FileBacking {
    pub driver: String,
    pub filename: String,
}

/// Arguments for `blockdev-add`. Field names follow the protocol's kebab
/// case on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct BlockdevAddArgs {
    #[serde(rename = "node-name")]
    pub node_name: String,
    pub driver: String,
    #[serde(rename = "read-only")]
    pub read_only: bool,
    pub file: FileBacking,
}

impl BlockdevAddArgs {
    /// A read-only raw node backed by a file on the host.
    pub fn raw_file(node_name: &str, filename: &str) -> Self {
        Self {
            node_name: node_name.to_string(),
            driver: "raw".to_string(),
            read_only: true,
            file: FileBacking {
                driver: "file".to_string(),
                filename: filename.to_string(),
            },
        }
    }
}

/// Arguments for `device_add`.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceAddArgs {
    pub driver: String,
    pub drive: String,
    pub id: String,
    pub serial: String,
}

impl DeviceAddArgs {
    /// A virtio block front-end wired to an existing node. The serial is
    /// what lets the guest correlate the device with a mount request.
    pub fn virtio_blk(drive: &str, serial: &str) -> Self {
        Self {
            driver: "virtio-blk-pci".to_string(),
            drive: drive.to_string(),
            id: drive.to_string(),
            serial: serial.to_string(),
        }
    }
}

/// Every command this crate sends. Each variant carries a typed argument
/// struct, so a malformed command is a compile error rather than a runtime
/// rejection.
#[derive(Debug, Clone)]
pub enum Command {
    QmpCapabilities,
    QueryBlockJobs,
    BlockdevAdd(BlockdevAddArgs),
    DeviceAdd(DeviceAddArgs),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::QmpCapabilities => "qmp_capabilities",
            Command::QueryBlockJobs => "query-block-jobs",
            Command::BlockdevAdd(_) => "blockdev-add",
            Command::DeviceAdd(_) => "device_add",
        }
    }

    /// The `{"execute": ..., "arguments": ...}` wire form. `arguments` is
    /// omitted entirely for commands that take none.
    pub(crate) fn to_wire(&self) -> Result<Value, serde_json::Error> {
        let arguments = match self {
            Command::QmpCapabilities | Command::QueryBlockJobs => None,
            Command::BlockdevAdd(args) => Some(serde_json::to_value(args)?),
            Command::DeviceAdd(args) => Some(serde_json::to_value(args)?),
        };
        let mut wire = serde_json::Map::new();
        wire.insert("execute".to_string(), Value::String(self.name().to_string()));
        if let Some(arguments) = arguments {
            wire.insert("arguments".to_string(), arguments);
        }
        Ok(Value::Object(wire))
    }
}
