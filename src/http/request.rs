//! # Parsing de Requests HTTP/1.0
//! src/http/request.rs
//!
//! Parser HTTP/1.0 mínimo (acepta también la request line de HTTP/1.1).
//!
//! ## Formato de un Request
//!
//! ```text
//! POST /hash HTTP/1.0\r\n
//! Content-Type: application/x-www-form-urlencoded\r\n
//! Content-Length: 20\r\n
//! \r\n
//! password=testpass123
//! ```

use std::collections::HashMap;
use std::io::{self, Read};

/// Métodos HTTP soportados
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    GET,
    HEAD,
    POST,
}

impl Method {
    fn from_str(s: &str) -> Result<Self, ParseError> {
        match s {
            "GET" => Ok(Method::GET),
            "HEAD" => Ok(Method::HEAD),
            "POST" => Ok(Method::POST),
            _ => Err(ParseError::UnsupportedMethod(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
        }
    }
}

/// Representa un request HTTP parseado
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,

    /// Path sin query string (ej: "/hash/1")
    path: String,

    /// Query parameters decodificados
    query_params: HashMap<String, String>,

    /// Headers con el nombre en minúsculas
    headers: HashMap<String, String>,

    body: Vec<u8>,
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Incomplete HTTP request")]
    IncompleteRequest,

    #[error("Invalid request line format")]
    InvalidRequestLine,

    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("Invalid HTTP version: {0}")]
    InvalidHttpVersion(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Request exceeds {0} bytes")]
    TooLarge(usize),

    #[error("Empty request")]
    EmptyRequest,
}

impl Request {
    /// Parsea un request completo desde bytes
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use hash_server::http::Request;
    ///
    /// let raw = b"GET /hash/1?verbose=1 HTTP/1.0\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.path(), "/hash/1");
    /// assert_eq!(request.query_param("verbose"), Some("1"));
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        if buffer.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(ParseError::EmptyRequest);
        }

        let header_end = find_header_end(buffer).unwrap_or(buffer.len());
        let head = std::str::from_utf8(&buffer[..header_end])
            .map_err(|_| ParseError::InvalidRequestLine)?;

        let mut lines = head.split("\r\n");
        let request_line = lines.next().ok_or(ParseError::IncompleteRequest)?;

        // 1. Request line
        let (method, path, query_params) = Self::parse_request_line(request_line)?;

        // 2. Headers
        let headers = Self::parse_headers(lines)?;

        // 3. Body (lo que venga después de \r\n\r\n, acotado por Content-Length)
        let body_start = (header_end + 4).min(buffer.len());
        let mut body = buffer[body_start..].to_vec();
        if let Some(len) = headers.get("content-length").and_then(|v| v.parse::<usize>().ok()) {
            body.truncate(len);
        }

        Ok(Request {
            method,
            path,
            query_params,
            headers,
            body,
        })
    }

    /// Parsea la request line: `METHOD /path?query VERSION`
    fn parse_request_line(
        line: &str,
    ) -> Result<(Method, String, HashMap<String, String>), ParseError> {
        let parts: Vec<&str> = line.split_whitespace().collect();

        if parts.len() != 3 {
            return Err(ParseError::InvalidRequestLine);
        }

        let method = Method::from_str(parts[0])?;

        let (path, query_params) = match parts[1].split_once('?') {
            Some((path, query)) => (path.to_string(), parse_urlencoded(query)),
            None => (parts[1].to_string(), HashMap::new()),
        };

        // Se acepta 1.1 pero siempre se responde 1.0
        if parts[2] != "HTTP/1.0" && parts[2] != "HTTP/1.1" {
            return Err(ParseError::InvalidHttpVersion(parts[2].to_string()));
        }

        Ok((method, path, query_params))
    }

    /// Cada header tiene formato "Name: Value"
    fn parse_headers<'a>(
        lines: impl Iterator<Item = &'a str>,
    ) -> Result<HashMap<String, String>, ParseError> {
        let mut headers = HashMap::new();

        for line in lines {
            if line.trim().is_empty() {
                break;
            }
            match line.split_once(':') {
                Some((name, value)) => {
                    headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
                }
                None => return Err(ParseError::InvalidHeader(line.to_string())),
            }
        }

        Ok(headers)
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Segmentos del path sin vacíos ("/hash/1" → ["hash", "1"])
    pub fn path_segments(&self) -> Vec<&str> {
        self.path.split('/').filter(|s| !s.is_empty()).collect()
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(|s| s.as_str())
    }

    /// Header por nombre (sin distinguir mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Campo de formulario: primero el body urlencoded, luego el query string
    pub fn form_param(&self, name: &str) -> Option<String> {
        let from_body = std::str::from_utf8(&self.body)
            .ok()
            .map(parse_urlencoded)
            .and_then(|mut form| form.remove(name));

        from_body.or_else(|| self.query_param(name).map(|s| s.to_string()))
    }
}

/// Parsea `a=1&b=hello+world` decodificando `+` y `%XX`
fn parse_urlencoded(input: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    for pair in input.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params.insert(decode_component(key), decode_component(value));
    }

    params
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    // Secuencias % inválidas o UTF-8 roto: se deja el texto tal cual
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| spaced.clone())
}

/// Posición del `\r\n\r\n` que separa headers del body
fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Lee un request completo del stream: headers + `Content-Length` bytes de body.
///
/// Devuelve `Ok(None)` si el peer cerró sin mandar nada.
pub fn read_request<R: Read>(stream: &mut R, max_bytes: usize) -> io::Result<Option<Vec<u8>>> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 4096];

    loop {
        if let Some(end) = find_header_end(&buffer) {
            let expected = declared_body_len(&buffer[..end]);
            let total = end + 4 + expected;
            if total > max_bytes {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    ParseError::TooLarge(max_bytes),
                ));
            }
            if buffer.len() >= total {
                buffer.truncate(total);
                return Ok(Some(buffer));
            }
        } else if buffer.len() > max_bytes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                ParseError::TooLarge(max_bytes),
            ));
        }

        let n = stream.read(&mut chunk)?;
        if n == 0 {
            // EOF: lo que haya llegado se entrega al parser
            return Ok(if buffer.is_empty() { None } else { Some(buffer) });
        }
        buffer.extend_from_slice(&chunk[..n]);
    }
}

fn declared_body_len(head: &[u8]) -> usize {
    let head = String::from_utf8_lossy(head);
    head.split("\r\n")
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_simple_get() {
        let raw = b"GET / HTTP/1.0\r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.path(), "/");
        assert_eq!(request.query_param("anything"), None);
        assert!(request.path_segments().is_empty());
    }

    #[test]
    fn test_path_segments() {
        let request = Request::parse(b"GET /hash/42 HTTP/1.0\r\n\r\n").unwrap();
        assert_eq!(request.path_segments(), vec!["hash", "42"]);
    }

    #[test]
    fn test_parse_with_headers_case_insensitive() {
        let raw = b"GET / HTTP/1.0\r\nHost: localhost:8042\r\nUser-Agent: test\r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.header("Host"), Some("localhost:8042"));
        assert_eq!(request.header("user-agent"), Some("test"));
    }

    #[test]
    fn test_post_form_body() {
        let raw = b"POST /hash HTTP/1.1\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: 20\r\n\r\npassword=testpass123";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.form_param("password"), Some("testpass123".to_string()));
    }

    #[test]
    fn test_form_decoding() {
        let raw = b"POST /hash HTTP/1.0\r\nContent-Length: 25\r\n\r\npassword=p%40ss+w%C3%B6rd";
        let request = Request::parse(raw).unwrap();
        assert_eq!(request.form_param("password"), Some("p@ss wörd".to_string()));
    }

    #[test]
    fn test_form_param_falls_back_to_query() {
        let request = Request::parse(b"POST /hash?password=abc HTTP/1.0\r\n\r\n").unwrap();
        assert_eq!(request.form_param("password"), Some("abc".to_string()));
        assert_eq!(request.form_param("missing"), None);
    }

    #[test]
    fn test_body_truncated_to_content_length() {
        let raw = b"POST /hash HTTP/1.0\r\nContent-Length: 5\r\n\r\npassword=x";
        let request = Request::parse(raw).unwrap();
        assert_eq!(request.body(), b"passw");
    }

    #[test]
    fn test_invalid_version() {
        let result = Request::parse(b"GET / HTTP/2.0\r\n\r\n");
        assert!(matches!(result, Err(ParseError::InvalidHttpVersion(_))));
    }

    #[test]
    fn test_unsupported_method() {
        let result = Request::parse(b"DELETE /hash/1 HTTP/1.0\r\n\r\n");
        assert!(matches!(result, Err(ParseError::UnsupportedMethod(_))));
    }

    #[test]
    fn test_empty_request() {
        assert!(matches!(Request::parse(b""), Err(ParseError::EmptyRequest)));
    }

    #[test]
    fn test_invalid_request_line() {
        let result = Request::parse(b"GET\r\n\r\n");
        assert!(matches!(result, Err(ParseError::InvalidRequestLine)));
    }

    #[test]
    fn test_invalid_header() {
        let result = Request::parse(b"GET / HTTP/1.0\r\nnot-a-header\r\n\r\n");
        assert!(matches!(result, Err(ParseError::InvalidHeader(_))));
    }

    #[test]
    fn test_read_request_waits_for_body() {
        let raw = b"POST /hash HTTP/1.0\r\nContent-Length: 10\r\n\r\npassword=xEXTRA".to_vec();
        let mut cursor = Cursor::new(raw);
        let bytes = read_request(&mut cursor, 1024).unwrap().unwrap();
        assert!(bytes.ends_with(b"password=x"));
    }

    #[test]
    fn test_read_request_eof_without_data() {
        let mut cursor = Cursor::new(Vec::new());
        assert!(read_request(&mut cursor, 1024).unwrap().is_none());
    }

    #[test]
    fn test_read_request_too_large() {
        let raw = b"POST /hash HTTP/1.0\r\nContent-Length: 5000\r\n\r\n".to_vec();
        let mut cursor = Cursor::new(raw);
        let err = read_request(&mut cursor, 256).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
