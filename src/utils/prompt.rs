use std::io::{self, BufRead, IsTerminal, Write};

use async_trait::async_trait;
use mockall::automock;

/// 交互式确认接口
#[automock]
#[async_trait]
pub trait ConfirmPrompt: Send + Sync {
    /// 当前是否能与操作员交互
    fn is_interactive(&self) -> bool;

    /// 提出是/否问题，读取失败或输入结束视为否。
    async fn confirm(&self, question: &str) -> io::Result<bool>;
}

/// 从标准输入读取回答。
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompt;

#[async_trait]
impl ConfirmPrompt for StdinPrompt {
    fn is_interactive(&self) -> bool {
        io::stdin().is_terminal()
    }

    async fn confirm(&self, question: &str) -> io::Result<bool> {
        let question = question.to_string();
        // 读取标准输入会阻塞，放到专用线程中执行
        tokio::task::spawn_blocking(move || {
            ask(&question, &mut io::stdin().lock(), &mut io::stdout())
        })
        .await
        .map_err(io::Error::other)?
    }
}

/// 写出问题并读取一行回答，输入结束视为否。
fn ask(question: &str, input: &mut impl BufRead, output: &mut impl Write) -> io::Result<bool> {
    write!(output, "{question} (y/N) ")?;
    output.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        return Ok(false);
    }
    Ok(is_yes(&answer))
}

/// 判断回答是否为肯定。
pub fn is_yes(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes" | "是"
    )
}
