use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Event Source Args ---
    /// Token sent as the Authorization header to the buyer-chat API
    #[arg(long, env = "WB_TOKEN", hide_env_values = true)]
    pub wb_token: String,

    /// Endpoint listing chats together with their product cards
    #[arg(
        long,
        env = "WB_CHATS_URL",
        default_value = "https://buyer-chat-api.wildberries.ru/api/v1/seller/chats"
    )]
    pub chats_url: String,

    /// Endpoint returning the paginated events feed
    #[arg(
        long,
        env = "WB_EVENTS_URL",
        default_value = "https://buyer-chat-api.wildberries.ru/api/v1/seller/events"
    )]
    pub events_url: String,

    /// Product ids (nmIDs) whose chats are tracked, comma separated
    #[arg(long, env = "TARGET_NM_IDS", value_delimiter = ',')]
    pub target_nm_ids: Vec<i64>,

    /// Pause before every events page request, in milliseconds.
    #[arg(long, env = "PAGE_DELAY_MS", default_value = "1000")]
    pub page_delay_ms: u64,

    /// Sleep between two poll cycles, in seconds.
    #[arg(long, env = "UPDATE_INTERVAL_SECS", default_value = "600")]
    pub update_interval_secs: u64,

    /// Timeout applied to every outgoing HTTP request, in seconds.
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value = "30")]
    pub http_timeout_secs: u64,

    // --- Sink Args ---
    /// Where rows are published (google, memory)
    #[arg(long, env = "SINK_TYPE", default_value = "google")]
    pub sink_type: String,

    /// Id of the target Google spreadsheet
    #[arg(long, env = "SPREADSHEET_ID")]
    pub spreadsheet_id: Option<String>,

    /// Path to the Google service account key (JSON)
    #[arg(long, env = "GOOGLE_SERVICE_ACCOUNT_PATH", default_value = "service_account.json")]
    pub service_account_path: String,

    /// Ready-made OAuth access token. When set, the service account key is not read.
    #[arg(long, env = "GOOGLE_ACCESS_TOKEN", hide_env_values = true)]
    pub google_access_token: Option<String>,

    #[arg(long, env = "SHEETS_BASE_URL", default_value = "https://sheets.googleapis.com/v4")]
    pub sheets_base_url: String,

    /// Sheet receiving the outcome rows
    #[arg(long, env = "CHATS_SHEET", default_value = "Chats")]
    pub chats_sheet: String,

    /// Sheet holding the last update time
    #[arg(long, env = "INFO_SHEET", default_value = "Info")]
    pub info_sheet: String,

    #[arg(long, env = "STATUS_LABEL", default_value = "Updated at")]
    pub status_label: String,

    /// Directory for a per-cycle CSV copy of the rows. Disabled when unset.
    #[arg(long, env = "CSV_DIR")]
    pub csv_dir: Option<String>,
}
