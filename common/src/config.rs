use const_fnv1a_hash::fnv1a_hash_str_32;
use std::{env, str::FromStr, time::Duration};

/// Variable de entorno con la URL del coordinador, ej: http://10.0.0.5:8080
pub const COORDINATOR_URL_ENV: &str = "COORDINATOR_URL";

pub const DEFAULT_LEASE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 1;
/// Espera de un worker sin tarea antes de volver a pedir; igual al lease.
pub const DEFAULT_WORKER_BACKOFF_MS: u64 = 10_000;
/// Base del reintento lineal de RPC ante errores transitorios.
pub const DEFAULT_RPC_RETRY_BACKOFF_MS: u64 = 1000;
pub const DEFAULT_WORKER_RPC_RETRIES: u32 = 5;

const BASE_PORT: u16 = 20000;
const PORT_SPAN: u64 = 10000;

/// Puerto por defecto para un usuario: usuarios distintos en la misma
/// máquina no chocan entre sí.
pub fn default_port_for(user: &str) -> u16 {
    BASE_PORT + (fnv1a_hash_str_32(user) as u64 % PORT_SPAN) as u16
}

pub fn default_port() -> u16 {
    default_port_for(&whoami::username())
}

/// URL base del coordinador.
/// - Si COORDINATOR_URL está definida, se usa tal cual.
/// - Si no, http://127.0.0.1:<puerto del usuario>.
pub fn coordinator_base_url() -> String {
    env::var(COORDINATOR_URL_ENV)
        .unwrap_or_else(|_| format!("http://127.0.0.1:{}", default_port()))
}

/// Lee una variable de entorno numérica; si falta o no parsea, usa el default.
pub fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .unwrap_or(default)
}

pub fn lease_timeout() -> Duration {
    Duration::from_secs(env_or("LEASE_TIMEOUT_SECS", DEFAULT_LEASE_TIMEOUT_SECS))
}

pub fn sweep_interval() -> Duration {
    Duration::from_secs(env_or("SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS).max(1))
}

pub fn worker_backoff() -> Duration {
    Duration::from_millis(env_or("WORKER_BACKOFF_MS", DEFAULT_WORKER_BACKOFF_MS))
}

pub fn rpc_retry_backoff() -> Duration {
    Duration::from_millis(env_or("RPC_RETRY_BACKOFF_MS", DEFAULT_RPC_RETRY_BACKOFF_MS))
}

pub fn worker_rpc_retries() -> u32 {
    env_or("WORKER_RPC_RETRIES", DEFAULT_WORKER_RPC_RETRIES)
}
