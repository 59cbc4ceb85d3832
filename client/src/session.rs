use crate::input::{MenuChoice, Prompter, MENU};
use crate::network::{ChatClient, ClientError};
use crate::rendering::{format_response, COLOR_NAMES};
use log::{debug, info};
use shared::{Request, DEFAULT_COLOR};
use tokio::io::{AsyncBufRead, AsyncWrite};

/// Drives the interactive menu over one server connection
pub struct Session<I, O> {
    client: ChatClient,
    prompter: Prompter<I, O>,
    username: String,
}

impl<I, O> Session<I, O>
where
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    pub fn new(client: ChatClient, prompter: Prompter<I, O>, username: String) -> Self {
        Self {
            client,
            prompter,
            username,
        }
    }

    /// Runs until the user quits, input ends, or the server goes away
    pub async fn run(mut self) -> Result<(), ClientError> {
        loop {
            self.prompter.say(MENU).await?;
            let Some(line) = self.prompter.ask("Choose: ").await? else {
                debug!("Input closed, leaving");
                self.client.send_request(&Request::quit()).await?;
                break;
            };

            let Some(choice) = MenuChoice::parse(&line) else {
                self.prompter.say("Invalid choice.").await?;
                continue;
            };

            if !self.handle(choice).await? {
                break;
            }
        }

        self.client.close().await
    }

    /// Returns false once the session should end
    async fn handle(&mut self, choice: MenuChoice) -> Result<bool, ClientError> {
        let request = match choice {
            MenuChoice::Chat => {
                let Some(message) = self.prompter.ask("Message: ").await? else {
                    return Ok(true);
                };
                let prompt = format!("Color ({}): ", COLOR_NAMES.join("/"));
                let answer = self.prompter.ask(&prompt).await?.unwrap_or_default();
                let color = if answer.is_empty() { DEFAULT_COLOR } else { answer.as_str() };
                Request::chat(&self.username, &message, color)
            }
            MenuChoice::Time => Request::time(),
            MenuChoice::Math => {
                let Some(a) = self.prompter.ask_number("a: ").await? else {
                    return Ok(true);
                };
                let Some(b) = self.prompter.ask_number("b: ").await? else {
                    return Ok(true);
                };
                Request::math(a, b)
            }
            MenuChoice::Quote => Request::quote(),
            MenuChoice::History => Request::history(),
            MenuChoice::Quit => {
                let response = self.client.send_request(&Request::quit()).await?;
                debug!("Quit acknowledged: {:?}", response.data);
                self.prompter.say("Goodbye!").await?;
                info!("Disconnected");
                return Ok(false);
            }
        };

        let response = self.client.send_request(&request).await?;
        self.prompter.say(&format_response(&response)).await?;
        self.prompter.say("").await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{decode_request, encode_response, RequestKind, Response};
    use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    const KEY: &[u8] = b"session_key";

    /// Answers each request with a canned response until the client hangs up
    async fn fake_server(listener: TcpListener) -> Vec<Request> {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut seen = Vec::new();
        let mut buffer = vec![0u8; 4096];
        loop {
            let n = socket.read(&mut buffer).await.unwrap();
            if n == 0 {
                break;
            }
            let request = decode_request(std::str::from_utf8(&buffer[..n]).unwrap(), KEY).unwrap();
            let response = match request.known_kind() {
                Some(RequestKind::Chat) => Response::ok(serde_json::json!({
                    "reply": format!("{}: {}", request.text_field("user", ""), request.text_field("message", "")),
                    "color": request.text_field("color", "reset"),
                })),
                Some(RequestKind::Math) => Response::ok(serde_json::json!({"result": 3.5})),
                Some(RequestKind::Quit) => Response::ok(serde_json::json!({"message": "Goodbye!"})),
                _ => Response::ok(serde_json::json!({})),
            };
            socket
                .write_all(encode_response(&response, KEY).unwrap().as_bytes())
                .await
                .unwrap();
            seen.push(request);
        }
        seen
    }

    #[tokio::test]
    async fn test_chat_then_quit() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(fake_server(listener));

        let client = ChatClient::connect(addr, KEY).await.unwrap();
        let input = BufReader::new("1\nhello\ngreen\n9\n3\n1\nx\n2.5\n6\n".as_bytes());
        let mut output = Vec::new();
        let session = Session::new(client, Prompter::new(input, &mut output), "ana".to_string());
        session.run().await.unwrap();

        let seen = server.await.unwrap();
        let kinds: Vec<_> = seen.iter().map(|r| r.known_kind()).collect();
        assert_eq!(
            kinds,
            vec![Some(RequestKind::Chat), Some(RequestKind::Math), Some(RequestKind::Quit)]
        );
        assert_eq!(seen[0].text_field("user", ""), "ana");
        assert_eq!(seen[0].text_field("color", ""), "green");
        assert_eq!(seen[1].field("b").and_then(|v| v.as_f64()), Some(2.5));

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("\x1b[92mana: hello\x1b[0m"));
        assert!(output.contains("Invalid choice."));
        assert!(output.contains("Please enter a number."));
        assert!(output.ends_with("Goodbye!\n"));
    }

    #[tokio::test]
    async fn test_input_end_sends_quit() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(fake_server(listener));

        let client = ChatClient::connect(addr, KEY).await.unwrap();
        let input = BufReader::new("".as_bytes());
        let session = Session::new(client, Prompter::new(input, Vec::new()), "ana".to_string());
        session.run().await.unwrap();

        let seen = server.await.unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].known_kind(), Some(RequestKind::Quit));
    }
}
