use crate::app::{AppContext, Result};
use crate::domain::{Post, Tags};

pub async fn search(ctx: &AppContext, words: &[String], json: bool) -> Result<()> {
    let tags = Tags::from_words(words)?;
    eprintln!("Loading posts for tags: {}", tags);

    let posts = ctx.orchestrator().fetch_posts(&tags).await?;

    if json {
        let values: Vec<_> = posts.iter().map(Post::to_value).collect();
        println!("{}", serde_json::to_string_pretty(&values)?);
        return Ok(());
    }

    if posts.is_empty() {
        println!("{}", crate::search::NO_POSTS);
        return Ok(());
    }

    for post in &posts {
        println!("{}", post_line(post));
    }
    eprintln!("Loaded {} posts", posts.len());

    Ok(())
}

pub fn endpoints(ctx: &AppContext, words: &[String]) -> Result<()> {
    let tags = Tags::from_words(words)?;
    for (index, url) in ctx.endpoints.build(&tags).iter().enumerate() {
        println!("{}. {}", index + 1, url);
    }
    Ok(())
}

pub async fn proxy(ctx: &AppContext) -> Result<()> {
    crate::proxy::serve(&ctx.config.proxy, &ctx.config.api.base_url).await
}

fn post_line(post: &Post) -> String {
    format!(
        "#{:<10} {:>6}  {}",
        post.display_id(),
        post.score,
        post.file_url
    )
}
