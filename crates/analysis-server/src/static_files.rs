//! Layered static asset lookup over the bundled web client

use std::sync::Arc;

use analysis_engine::AssetStore;
use tracing::debug;

/// Asset roots, most preferred first: built output, then sources.
pub const ASSET_ROOTS: [&str; 2] = ["wintrchess/dist", "wintrchess/public"];

/// Named analysis page served at `/app/analysis`
pub const ANALYSIS_PAGE: &str = "wintrchess/public/apps/features/analysis.html";

/// Pages with this suffix get the mobile fix-up injected into `<head>`.
const FIXUP_SUFFIX: &str = "analysis.html";

const MOBILE_FIXUP: &str = concat!(
    r#"<meta name="viewport" content="width=device-width, initial-scale=1, maximum-scale=1, user-scalable=no">"#,
    "<style>html,body{width:100%;max-width:100%;overflow-x:hidden;margin:0;padding:0;}",
    ".root,#root,#app,.analysis-page{max-width:100%;overflow-x:hidden;}",
    "canvas,svg,img,video{max-width:100% !important;height:auto !important;}",
    ".board,.board-container,.board-wrapper{max-width:100vw !important;overflow:hidden;}",
    "</style>",
    "<script>(function(){",
    "function fit(){",
    " const vw=Math.min(window.innerWidth||document.documentElement.clientWidth||360,(window.screen&&window.screen.width)||9999);",
    " document.documentElement.style.setProperty('--vw',vw+'px');",
    " document.querySelectorAll('.board,.board-container,.board-wrapper,#board,#board-container').forEach(el=>{",
    "el.style.width=vw+'px';el.style.maxWidth=vw+'px';el.style.overflow='hidden';el.style.margin='0 auto';});",
    " document.querySelectorAll('canvas').forEach(c=>{",
    "  const rawW=c.width||c.getBoundingClientRect().width||vw;",
    "  if(rawW>0){c.style.transform='scale('+(vw/rawW)+')';c.style.transformOrigin='top left';}",
    "  c.style.width=rawW+'px';c.style.maxWidth=vw+'px';c.style.height='auto';",
    "  if(c.parentElement){const p=c.parentElement.style;p.width=vw+'px';p.maxWidth=vw+'px';p.overflow='hidden';}",
    " });",
    "}",
    "window.addEventListener('load',()=>{fit();setTimeout(fit,300);setTimeout(fit,1000);});",
    "window.addEventListener('resize',fit);",
    "})();</script>",
);

/// A resolved asset ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

#[derive(Clone)]
pub struct StaticAssets {
    store: Arc<dyn AssetStore>,
}

impl StaticAssets {
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self { store }
    }

    /// Load one bundle path, applying the analysis-page fix-up where it applies.
    pub async fn load(&self, path: &str) -> Option<Asset> {
        let mut body = self.store.read(path).await.ok()?;
        if path.ends_with(FIXUP_SUFFIX) {
            body = inject_mobile_fixup(&String::from_utf8_lossy(&body)).into_bytes();
        }
        Some(Asset {
            content_type: content_type(path),
            body,
        })
    }

    /// Resolve a request path against each root in order.
    pub async fn resolve(&self, request_path: &str) -> Option<Asset> {
        let relative = request_path.strip_prefix('/').unwrap_or(request_path);
        for root in ASSET_ROOTS {
            if let Some(asset) = self.load(&format!("{root}/{relative}")).await {
                debug!(path = request_path, root, "Static asset");
                return Some(asset);
            }
        }
        None
    }
}

/// Insert the viewport meta, width CSS and canvas re-fit script before the
/// first `</head>`. Pages without one are returned unchanged.
pub fn inject_mobile_fixup(html: &str) -> String {
    html.replacen("</head>", &format!("{MOBILE_FIXUP}</head>"), 1)
}

pub fn content_type(path: &str) -> &'static str {
    let ext = path.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    match ext {
        "js" => "application/javascript",
        "css" => "text/css",
        "json" => "application/json",
        "html" => "text/html",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "woff2" => "font/woff2",
        "woff" => "font/woff",
        "ttf" => "font/ttf",
        _ => "application/octet-stream",
    }
}

/// Built-in page used when the bundled analysis page is missing
pub const FALLBACK_ANALYSIS_PAGE: &str = concat!(
    "<!doctype html><html><head><meta charset='utf-8'><title>MartinDuck Analysis</title>",
    "<style>body{font-family:Segoe UI,Arial,sans-serif;background:#1e1e1e;color:#eee;padding:16px;}",
    "textarea, input, button{font:14px Segoe UI,Arial;border-radius:6px;border:1px solid #444;background:#2b2b2b;color:#fff;padding:8px;}",
    "button{cursor:pointer;background:#6fb64a;border:none;}",
    "#out{white-space:pre;font-family:Consolas,monospace;background:#111;padding:12px;border-radius:8px;border:1px solid #333;}",
    "</style></head><body>",
    "<h2>MartinDuck Analysis</h2>",
    "<label>FEN</label><br><textarea id='fen' rows='3' style='width:100%'></textarea><br>",
    "<label>Moves</label><input id='mpv' type='number' min='1' max='8' value='3' style='width:80px;margin-left:8px;'>",
    "<button id='btn'>Analyze</button>",
    "<pre id='out'></pre>",
    "<script>const out=document.getElementById('out');document.getElementById('btn').onclick=async()=>{",
    "out.textContent='Running...';",
    "try{const fen=document.getElementById('fen').value.trim();",
    "const limit=parseInt(document.getElementById('mpv').value||'3',10);",
    "const r=await fetch('/api/analyze',{method:'POST',headers:{'Content-Type':'application/json'},body:JSON.stringify({fen:fen,limit:limit})});",
    "out.textContent=await r.text();}catch(e){out.textContent='Error '+e.message;}};</script>",
    "</body></html>",
);
